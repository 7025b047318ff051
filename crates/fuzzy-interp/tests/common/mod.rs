//! Shared catalog fixture for integration tests.

/// A small catalog: a slope curve, a crisp flooding check, a depth curve
/// keyed by property id, a `Flood Hazard` rule and a `Dwellings` rule that
/// expands `Flood Hazard` as a sub-rule.
pub const CATALOG: &str = r#"{
    "properties": [
        {"id": "p1", "name": "slope", "unitOfMeasure": "percent", "min": 0, "max": 100},
        {"id": "p2", "name": "flooding frequency", "isCategorical": true},
        {"id": "p3", "name": "depth to bedrock", "unitOfMeasure": "cm", "modifier": "RV"}
    ],
    "evaluations": [
        {
            "id": "e1", "name": "Slope Steep", "propertyName": "slope",
            "points": [{"x": 0, "y": 0}, {"x": 10, "y": 1}]
        },
        {
            "id": "e2", "name": "Flooding", "propertyName": "flooding frequency",
            "type": "crisp", "crispExpression": "'frequent', 'occasional'"
        },
        {
            "id": "e3", "name": "Depth Shallow", "propertyName": "p3",
            "points": [{"x": 50, "y": 1}, {"x": 150, "y": 0}]
        }
    ],
    "rules": [
        {
            "id": "r1", "name": "Flood Hazard",
            "nodes": [
                {"levelName": "Flood Hazard"},
                {"levelName": "  Flooding", "refId": "Flooding"}
            ]
        },
        {
            "id": "r2", "name": "Dwellings",
            "nodes": [
                {"levelName": "Dwellings"},
                {"levelName": "  OR"},
                {"levelName": "    Slope", "refId": "Slope Steep"},
                {"levelName": "    Flood", "refId": "Flood Hazard"},
                {"levelName": "    Depth", "refId": "e3"}
            ]
        }
    ]
}"#;
