use phishguard::{detectors::ReferenceData, FeatureExtractor, FeatureSchema};
use proptest::prelude::*;

proptest! {
    #[test]
    fn extraction_is_total(input in ".{0,200}") {
        for schema in [FeatureSchema::Base, FeatureSchema::Extended] {
            let extractor = FeatureExtractor::new(schema, &ReferenceData::default());
            let v = extractor.extract(&input);
            prop_assert_eq!(v.len(), schema.len());
            prop_assert!(v.values().iter().all(|x| matches!(x, -1 | 0 | 1)));
            prop_assert_eq!(v, extractor.extract(&input));
        }
    }

    #[test]
    fn url_shaped_input_is_total(
        scheme in "(http|https|ftp|)",
        host in "[a-z0-9.-]{0,40}",
        path in "[a-zA-Z0-9/@?=&%._-]{0,80}",
    ) {
        let url = format!("{}://{}/{}", scheme, host, path);
        let extractor = FeatureExtractor::new(FeatureSchema::Extended, &ReferenceData::default());
        let v = extractor.extract(&url);
        prop_assert_eq!(v.len(), 10);
        prop_assert!(v.values().iter().all(|x| matches!(x, -1 | 0 | 1)));
    }
}
