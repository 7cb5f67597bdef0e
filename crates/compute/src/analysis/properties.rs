use formats::GeoJson;
use serde::Serialize;
use serde_json::Value;

/// One attribute of the first feature, offered as a candidate admin-name key.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SampleProperty {
    pub name: String,
    pub value: Value,
}

/// Properties of the first feature of a feature collection, in document order.
///
/// Empty for anything that is not a non-empty feature collection.
pub fn sample_properties(doc: &GeoJson) -> Vec<SampleProperty> {
    let Some(first) = doc
        .as_feature_collection()
        .and_then(|fc| fc.features.first())
    else {
        return Vec::new();
    };

    first
        .properties
        .iter()
        .map(|(name, value)| SampleProperty {
            name: name.clone(),
            value: value.clone(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn lists_first_feature_properties_in_order() {
        let doc = GeoJson::from_value(&json!({
            "type": "FeatureCollection",
            "features": [
                {"type": "Feature", "properties": {"ADM1_EN": "Nairobi", "pcode": 47}, "geometry": null},
                {"type": "Feature", "properties": {"other": true}, "geometry": null}
            ]
        }))
        .unwrap();

        let props = sample_properties(&doc);
        assert_eq!(
            props,
            vec![
                SampleProperty { name: "ADM1_EN".into(), value: json!("Nairobi") },
                SampleProperty { name: "pcode".into(), value: json!(47) },
            ]
        );
    }

    #[test]
    fn non_collections_have_no_samples() {
        let feature = GeoJson::from_value(&json!({
            "type": "Feature", "properties": {"a": 1}, "geometry": null
        }))
        .unwrap();
        assert!(sample_properties(&feature).is_empty());

        let empty = GeoJson::from_value(&json!({"type": "FeatureCollection", "features": []})).unwrap();
        assert!(sample_properties(&empty).is_empty());
    }
}
