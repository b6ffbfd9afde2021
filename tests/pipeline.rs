// End-to-end: Bronze -> Silver -> Gold -> Prescriptive against real stores

use konser_lakehouse::record::from_csv_bytes;
use konser_lakehouse::{
    Affordability, BlobStore, ConcertRecord, GoldRecord, LayerFolders, Lakehouse, Layer,
    LocalStore, MemoryStore, PipelineError, PrescriptiveEngine,
};
use std::io::Write;

const SOURCE: &str = "\
nama_konser,lokasi,tanggal,harga_tiket,biaya_transport,biaya_akomodasi,merchandise,total_pengeluaran,catatan
BTS World Tour,Jakarta,2024-03-15,1500000,200000,500000,300000,2500000,front row
Blackpink,Jakarta,2024-04-20,1200000,150000,,250000,1600000,
IU Golden Hour,Bandung,not a date,900000,100000,0,,1000000,
,Surabaya,2024-05-01,1,1,1,1,4,no name
Twice,Bali,2024-06-01,2000000,1500000,1000000,500000,5000000,
Seventeen,Jakarta,2024-07-20,1000000,100000,100000,100000,-1,bad total
NewJeans,Bandung,2024-08-01,800000,100000,100000,200000,,missing total
";

fn write_source(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

fn memory_lakehouse() -> Lakehouse {
    Lakehouse::with_store(Box::new(MemoryStore::new()), LayerFolders::default())
}

#[test]
fn test_full_run_with_memory_store() {
    let source = write_source(SOURCE);
    let mut lakehouse = memory_lakehouse();

    let run = lakehouse.run(source.path(), 3_000_000.0).unwrap();

    // Bronze keeps every row and column
    assert_eq!(run.bronze.len(), 7);
    assert_eq!(run.bronze.headers().len(), 9);

    // Silver drops: no name, negative total, missing total
    let names: Vec<&str> = run.silver.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(
        names,
        vec!["BTS World Tour", "Blackpink", "IU Golden Hour", "Twice"]
    );
    assert_eq!(run.silver[2].date, None);
    assert_eq!(run.silver[2].merchandise, None);

    // Gold
    assert_eq!(run.gold.records.len(), 4);
    for record in &run.gold.records {
        assert!((0.0..=1.0).contains(&record.efficiency_score));
    }
    assert_eq!(run.gold.records[0].affordability, Affordability::AtLimit);
    assert_eq!(run.gold.records[1].affordability, Affordability::Affordable);
    assert_eq!(run.gold.records[2].affordability, Affordability::VeryAffordable);
    assert_eq!(run.gold.records[3].affordability, Affordability::NotAffordable);

    let locations: Vec<(&str, usize)> = run
        .gold
        .location_stats
        .iter()
        .map(|s| (s.location.as_str(), s.count))
        .collect();
    assert_eq!(locations, vec![("Bali", 1), ("Bandung", 1), ("Jakarta", 2)]);
    let jakarta = &run.gold.location_stats[2];
    assert_eq!(jakarta.mean, 2_050_000.0);
    assert_eq!(jakarta.min, 1_600_000.0);
    assert_eq!(jakarta.max, 2_500_000.0);

    // Persisted names share the run timestamp
    let stamp = &run.timestamp;
    let expected = [
        (Layer::Bronze, format!("bronze/konser_raw_{}.csv", stamp)),
        (Layer::Silver, format!("silver/konser_cleaned_{}.csv", stamp)),
        (Layer::Gold, format!("gold/konser_analytics_{}.csv", stamp)),
    ];
    assert_eq!(lakehouse.latest_outputs().unwrap(), expected.to_vec());

    // Persisted tables read back to what the run returned
    let silver_bytes = lakehouse.store().download(&expected[1].1).unwrap();
    let silver: Vec<ConcertRecord> = from_csv_bytes(&silver_bytes).unwrap();
    assert_eq!(silver, run.silver);

    let gold_bytes = lakehouse.store().download(&expected[2].1).unwrap();
    let gold: Vec<GoldRecord> = from_csv_bytes(&gold_bytes).unwrap();
    assert_eq!(gold, run.gold.records);

    // Prescriptive over the Gold table
    let rec = PrescriptiveEngine::new(&run.gold.records, 3_000_000.0)
        .calc_scores()
        .unwrap();
    assert_eq!(rec.ranked.len(), 3, "Twice is over budget");
    assert_eq!(rec.optimal.name, "Blackpink");
    assert_eq!(rec.optimal.sisa_budget, 1_400_000.0);
    assert!((rec.optimal.prescriptive_score - 0.604).abs() < 1e-9);

    let iu = rec.ranked.iter().find(|r| r.name == "IU Golden Hour").unwrap();
    assert!((iu.score_cost - 0.6).abs() < 1e-9);
    assert_eq!(iu.score_remaining, 1.0);
    assert_eq!(iu.score_experience, 0.0, "missing merchandise");
    for pair in rec.ranked.windows(2) {
        assert!(pair[0].prescriptive_score >= pair[1].prescriptive_score);
    }
}

#[test]
fn test_single_row_scenario() {
    let source = write_source(
        "nama_konser,lokasi,tanggal,harga_tiket,biaya_transport,biaya_akomodasi,merchandise,total_pengeluaran\n\
         Solo,Jakarta,2024-01-01,50,20,10,20,100\n",
    );
    let mut lakehouse = memory_lakehouse();
    let run = lakehouse.run(source.path(), 200.0).unwrap();

    let rec = PrescriptiveEngine::new(&run.gold.records, 200.0)
        .calc_scores()
        .unwrap();
    assert_eq!(rec.optimal.name, "Solo");
    assert!((rec.optimal.prescriptive_score - 1.0).abs() < 1e-9);
}

#[test]
fn test_budget_below_every_total_has_no_recommendation() {
    let source = write_source(SOURCE);
    let mut lakehouse = memory_lakehouse();
    let run = lakehouse.run(source.path(), 500_000.0).unwrap();

    assert!(run
        .gold
        .records
        .iter()
        .all(|r| r.affordability == Affordability::NotAffordable));
    assert!(PrescriptiveEngine::new(&run.gold.records, 500_000.0)
        .calc_scores()
        .is_none());
}

#[test]
fn test_missing_column_stops_before_silver_is_written() {
    let source = write_source("nama_konser,lokasi,total_pengeluaran\nBTS,Jakarta,100\n");
    let mut lakehouse = memory_lakehouse();

    let err = lakehouse.run(source.path(), 1000.0).unwrap_err();
    assert!(matches!(err, PipelineError::Schema { .. }));
    assert!(err.to_string().starts_with("Missing required columns: tanggal"));

    let outputs = lakehouse.latest_outputs().unwrap();
    assert_eq!(outputs.len(), 1, "only bronze was persisted");
    assert_eq!(outputs[0].0, Layer::Bronze);
}

#[test]
fn test_all_rows_dropped_gives_empty_gold() {
    let source = write_source(
        "nama_konser,lokasi,tanggal,harga_tiket,biaya_transport,biaya_akomodasi,merchandise,total_pengeluaran\n\
         ,Jakarta,,,,,,100\n\
         BTS,Jakarta,,,,,,-5\n",
    );
    let mut lakehouse = memory_lakehouse();
    let run = lakehouse.run(source.path(), 1000.0).unwrap();

    assert!(run.silver.is_empty());
    assert!(run.gold.is_empty());
    assert!(PrescriptiveEngine::new(&run.gold.records, 1000.0)
        .calc_scores()
        .is_none());
}

#[test]
fn test_full_run_with_local_store() {
    let dir = tempfile::tempdir().unwrap();
    let folders = LayerFolders::default();
    let store = LocalStore::new(dir.path(), &folders).unwrap();
    let mut lakehouse = Lakehouse::with_store(Box::new(store), folders);

    let source = write_source(SOURCE);
    let run = lakehouse.run(source.path(), 3_000_000.0).unwrap();

    let gold_path = dir
        .path()
        .join("gold")
        .join(format!("konser_analytics_{}.csv", run.timestamp));
    assert!(gold_path.exists());

    let text = std::fs::read_to_string(&gold_path).unwrap();
    assert!(text.starts_with(
        "nama_konser,lokasi,tanggal,harga_tiket,biaya_transport,biaya_akomodasi,merchandise,total_pengeluaran,efficiency_score,affordability\n"
    ));
    assert_eq!(text.lines().count(), 5);

    let latest = lakehouse.latest_outputs().unwrap();
    assert_eq!(latest.len(), 3);
    assert!(lakehouse.store().delete(&latest[0].1).unwrap());
    assert!(!lakehouse.store().delete(&latest[0].1).unwrap());
}
