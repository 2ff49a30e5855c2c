//! Material master data referenced by order line items.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, Hash)]
#[sqlx(type_name = "material_category")]
pub enum MaterialCategory {
    Raw,
    Finished,
    #[sqlx(rename = "Semi-finished")]
    #[serde(rename = "Semi-finished")]
    SemiFinished,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn semi_finished_uses_hyphenated_name() {
        let json = serde_json::to_string(&MaterialCategory::SemiFinished).unwrap();
        assert_eq!(json, "\"Semi-finished\"");
        let back: MaterialCategory = serde_json::from_str("\"Semi-finished\"").unwrap();
        assert_eq!(back, MaterialCategory::SemiFinished);
    }
}
