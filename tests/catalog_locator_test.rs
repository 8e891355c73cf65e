// ==========================================
// Catalog + ImageLocator 集成测试
// ==========================================

use std::path::Path;

use weather_spider::domain::{Catalog, ForecastHorizon, WeatherVariable};
use weather_spider::engine::ImageLocator;
use weather_spider::SpiderError;

const HORIZONS: [ForecastHorizon; 3] = [
    ForecastHorizon::Days15,
    ForecastHorizon::Days60,
    ForecastHorizon::Days180,
];

#[test]
fn test_every_valid_coordinate_is_deterministic() {
    let catalog = Catalog::global();
    let locator = ImageLocator::new("http://example.test");
    let root = Path::new("downloads");

    for crop in 0..catalog.crops().len() {
        for entry in catalog.entries_of(crop) {
            for variable in WeatherVariable::ALL {
                for horizon in HORIZONS {
                    let (r, s) = (entry.region_index, entry.subregion_index);
                    let url1 = locator.build_image_url(crop, r, s, variable, horizon, "42").unwrap();
                    let url2 = locator.build_image_url(crop, r, s, variable, horizon, "42").unwrap();
                    assert_eq!(url1, url2);
                    assert!(!url1.is_empty());

                    let path1 = locator
                        .generate_save_path(crop, r, s, variable, horizon, "20250301", root)
                        .unwrap();
                    let path2 = locator
                        .generate_save_path(crop, r, s, variable, horizon, "20250301", root)
                        .unwrap();
                    assert_eq!(path1, path2);
                    assert!(path1.starts_with(root.join(variable.code()).join("20250301")));
                }
            }
        }
    }
}

#[test]
fn test_invalid_coordinates_are_rejected() {
    let catalog = Catalog::global();
    let locator = ImageLocator::new("http://example.test");
    let root = Path::new("downloads");
    let var = WeatherVariable::Temperature;
    let h = ForecastHorizon::Days60;

    let crops = catalog.crops().len();
    let mut invalid = vec![(crops, 0, 0), (usize::MAX, 0, 0)];
    for crop in 0..crops {
        let regions = catalog.regions_of(crop).len();
        invalid.push((crop, regions, 0));
        for region in 0..regions {
            let subs = catalog.subregions_of(crop, region).len();
            invalid.push((crop, region, subs));
        }
    }

    for (c, r, s) in invalid {
        assert!(
            matches!(
                locator.build_image_url(c, r, s, var, h, "1"),
                Err(SpiderError::InvalidCoordinate(_))
            ),
            "url ({}, {}, {})",
            c,
            r,
            s
        );
        assert!(
            matches!(
                locator.generate_save_path(c, r, s, var, h, "20250301", root),
                Err(SpiderError::InvalidCoordinate(_))
            ),
            "path ({}, {}, {})",
            c,
            r,
            s
        );
    }
}

#[test]
fn test_url_and_path_share_crop_and_subregion() {
    let catalog = Catalog::global();
    let locator = ImageLocator::new("http://example.test");

    for crop in 0..catalog.crops().len() {
        for entry in catalog.entries_of(crop) {
            let (r, s) = (entry.region_index, entry.subregion_index);
            let url = locator
                .build_image_url(crop, r, s, WeatherVariable::Precipitation, ForecastHorizon::Days15, "4890")
                .unwrap();
            let path = locator
                .generate_save_path(
                    crop,
                    r,
                    s,
                    WeatherVariable::Precipitation,
                    ForecastHorizon::Days15,
                    "20250301",
                    Path::new("d"),
                )
                .unwrap();

            let url_name = url.rsplit('/').next().unwrap();
            let file_name = path.file_name().unwrap().to_str().unwrap();

            let url_segment = format!("_{}_{}_4890.png", entry.crop, entry.subregion);
            let path_segment = format!("_{}_{}_{}_forecast.png", entry.crop, entry.region, entry.subregion);
            assert!(url_name.ends_with(&url_segment), "{}", url_name);
            assert!(file_name.ends_with(&path_segment), "{}", file_name);
            // 文件名不含图片编号
            assert!(!file_name.contains("4890"));
        }
    }
}

#[test]
fn test_catalog_lookup_is_permissive() {
    let catalog = Catalog::global();
    assert!(catalog.regions_of(100).is_empty());
    assert!(catalog.subregions_of(0, 100).is_empty());
    assert_eq!(catalog.name_of("brazil"), "巴西");
    assert_eq!(catalog.name_of("unknown_code"), "unknown_code");
}
