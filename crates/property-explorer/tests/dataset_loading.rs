use property_explorer::config::DataConfig;
use property_explorer::market::dataset::{
    self, Availability, DataLoadError, DatasetBundle, DatasetCache, TableKind,
};
use property_explorer::market::resolver::{self, MatchKind};

fn fixture_config() -> DataConfig {
    DataConfig::new(concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/data"))
}

#[test]
fn fixture_tables_all_load() {
    let bundle = DatasetBundle::load(&fixture_config());
    let summary = bundle.summary();

    assert_eq!(summary.regions, 7);
    for status in &summary.tables {
        assert!(status.loaded, "{} failed: {:?}", status.label, status.error);
    }

    let series = bundle
        .time_series
        .lookup("ADELAIDE")
        .available()
        .copied()
        .expect("adelaide series");
    assert_eq!(series.len(), 28);
    assert!(series.windows(2).all(|pair| pair[0].quarter < pair[1].quarter));
}

#[test]
fn abbreviated_names_join_across_tables() {
    let bundle = DatasetBundle::load(&fixture_config());
    let region = resolver::resolve(&bundle, "Mt Barker").expect("alias resolves");

    assert_eq!(region.name, "MOUNT BARKER");
    assert_eq!(region.matched_by, MatchKind::Alias);
    assert!(region.property.is_available());
    assert!(region.time_series.is_available());
    assert!(matches!(region.crime, Availability::Missing));
}

#[test]
fn alias_file_extends_builtin_aliases() {
    let bundle = DatasetBundle::load(&fixture_config());
    let region = resolver::resolve(&bundle, "Glenelg Beach").expect("file alias resolves");
    assert_eq!(region.name, "GLENELG");
}

#[test]
fn missing_directory_degrades_every_table_without_panicking() {
    let bundle = DatasetBundle::load(&DataConfig::new("./no-such-data-dir"));
    let summary = bundle.summary();

    assert_eq!(summary.regions, 0);
    assert!(matches!(
        bundle.master.error(),
        Some(DataLoadError::MissingFile {
            table: TableKind::Master,
            ..
        })
    ));
    assert!(summary
        .tables
        .iter()
        .filter(|status| status.table != TableKind::Aliases)
        .all(|status| !status.loaded));
}

#[test]
fn cache_loads_the_fixture_once() {
    let cache = DatasetCache::new();
    let config = fixture_config();

    std::thread::scope(|scope| {
        for _ in 0..4 {
            scope.spawn(|| {
                let bundle = cache.get_or_load(&config);
                assert_eq!(bundle.regions().len(), 7);
            });
        }
    });

    assert_eq!(cache.loads(), 1);
    let first: *const DatasetBundle = dataset::shared(&config);
    let second: *const DatasetBundle = dataset::shared(&DataConfig::new("ignored"));
    assert_eq!(first, second);
}
