//! API response types for the status service.

/// Response body of `GET /api/barn`.
///
/// Serializes with the fields in this order:
/// `{"count":1,"doorStatus":"opening","goats":["Bron"]}`.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GateStatus {
    /// Number of animals inside.
    pub count: usize,
    /// Door status label.
    #[cfg_attr(feature = "serde", serde(rename = "doorStatus"))]
    pub door_status: String,
    /// Names inside, in order of entry.
    pub goats: Vec<String>,
}

impl GateStatus {
    /// Build a status from occupancy names and a door label.
    pub fn new<'a>(names: impl IntoIterator<Item = &'a str>, door_status: &str) -> Self {
        let goats: Vec<String> = names.into_iter().map(String::from).collect();
        Self {
            count: goats.len(),
            door_status: door_status.into(),
            goats,
        }
    }
}

impl Default for GateStatus {
    fn default() -> Self {
        Self::new([], "closed")
    }
}
