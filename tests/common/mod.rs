#![allow(dead_code)]

use rdtdash::charts::SourceSettings;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

pub const POSITIVE_TESTS: &str = "\
YEAR,JURISDICTION,METRIC,COUNT
2020,NSW,positive_drug_tests,500
2020,VIC,positive_drug_tests,300
2020,NSW,positive_breath_tests,9000
2021,NSW,positive_drug_tests,400
2021,VIC,positive_drug_tests,N/A
2021,QLD,positive_drug_tests,250
2022,,positive_drug_tests,40
2022,QLD,positive_drug_tests,1250.5
";

pub const DETECTION_STAGES: &str = "\
DETECTION_METHOD,Sum(COUNT)
Laboratory or Toxicology (Stage 3),200
Indicator (Stage 1),600
Secondary Confirmatory (Stage 2),200
Roadside Survey,0
";

pub const ENFORCEMENT_ACTIONS: &str = "\
JURISDICTION,Sum(FINES),Sum(ARRESTS),Sum(CHARGES)
VIC,120,10,30
NSW,300,25,80
ACT,5,1,2
";

pub const AGE_GROUPS: &str = "\
AGE_GROUP,Sum(COUNT)
17-25,1200
26-39,2100
40-64,900
65 and over,30
";

pub const STATE_TOTALS: &str = "\
YEAR,JURISDICTION,Sum(COUNT)
2022,NSW,3000
2022,VIC,1000
2023,NSW,2000
2023,TAS,0
";

pub const BOUNDARIES: &str = r#"{
  "type": "FeatureCollection",
  "features": [
    {"type": "Feature", "properties": {"STATE_NAME": "New South Wales"},
     "geometry": {"type": "Polygon", "coordinates": [[[141.0,-29.0],[153.6,-28.2],[150.0,-37.5],[141.0,-34.0],[141.0,-29.0]]]}},
    {"type": "Feature", "properties": {"STATE_NAME": "Victoria"},
     "geometry": {"type": "Polygon", "coordinates": [[[141.0,-34.0],[150.0,-37.5],[141.0,-39.0],[141.0,-34.0]]]}},
    {"type": "Feature", "properties": {"STATE_NAME": "Tasmania"},
     "geometry": {"type": "MultiPolygon", "coordinates": [[[[144.6,-40.7],[148.3,-40.9],[146.8,-43.6],[144.6,-40.7]]]]}},
    {"type": "Feature", "properties": {"STATE_NAME": "Other Territories"},
     "geometry": {"type": "Polygon", "coordinates": [[[150.6,-35.1],[150.8,-35.1],[150.7,-35.2],[150.6,-35.1]]]}}
  ]
}"#;

pub fn write(dir: &Path, name: &str, content: &str) {
    fs::write(dir.join(name), content).expect("Failed to write sample file");
}

/// A temp data directory holding every dashboard source under its default name.
pub fn sample_data_dir() -> (TempDir, SourceSettings) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let settings = SourceSettings {
        data_dir: temp_dir.path().to_path_buf(),
        ..SourceSettings::default()
    };
    write(temp_dir.path(), &settings.positive_tests, POSITIVE_TESTS);
    write(temp_dir.path(), &settings.detection_stages, DETECTION_STAGES);
    write(
        temp_dir.path(),
        &settings.enforcement_actions,
        ENFORCEMENT_ACTIONS,
    );
    write(temp_dir.path(), &settings.age_groups, AGE_GROUPS);
    write(temp_dir.path(), &settings.state_totals, STATE_TOTALS);
    write(temp_dir.path(), &settings.boundaries, BOUNDARIES);
    (temp_dir, settings)
}
