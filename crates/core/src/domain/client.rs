use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClientId(pub String);

/// Reference to the client picked on the first step; the record itself lives
/// with the client directory, outside the wizard.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientRef {
    pub id: ClientId,
    pub display_name: String,
}

impl ClientRef {
    pub fn new(id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self { id: ClientId(id.into()), display_name: display_name.into() }
    }
}
