use std::fs;
use std::path::Path;

use chrono::NaiveDate;
use lotsync::models::{MergeCounts, PriceMap};
use lotsync::processors::pricing::{PhaseGroup, PriceScope};
use lotsync::processors::view::InventoryFilter;
use lotsync::storage::memory::MemoryStore;
use lotsync::{AppConfig, AppError, RemoteStore, RemoteSync, Workspace};
use tempfile::TempDir;

const UPLOAD: &str = "MVLC Lot Inventory\n\
                      \n\
                      Lot #,Phase,Size (sqm),Status,Category,Rsv Date\n\
                      A-1,1K,120,Open,,\n\
                      A-2,2,90,Sold,Prime,2024-03-05\n\
                      B-7,3-C,\"1,050\",RSV,,03/05/2024\n";

fn workspace<'a>(dir: &TempDir, store: Option<&'a dyn RemoteStore>) -> Workspace<'a> {
    Workspace::new(AppConfig::with_cache_dir(dir.path()), store)
}

fn day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 18).unwrap()
}

#[test]
fn test_import_merges_into_empty_inventory_and_syncs() {
    let dir = TempDir::new().unwrap();
    let store = MemoryStore::signed_in("agent-1");
    let ws = workspace(&dir, Some(&store));

    let report = ws.import_text("MVLC", UPLOAD).unwrap();

    assert_eq!(report.batch.header_row, 2);
    assert_eq!(report.counts, MergeCounts { updated: 0, inserted: 3 });
    assert_eq!(report.remote, RemoteSync::Completed { updated: 0, inserted: 3 });
    assert_eq!(report.summary(), "Imported 3 rows for MVLC: updated 0, added 3");

    let cached = ws.inventory("MVLC").unwrap();
    assert_eq!(cached.len(), 3);
    assert_eq!(cached.get("A-1", Some(1)).unwrap().category, "Regular Corner");
    assert_eq!(cached.get("b-7", Some(3)).unwrap().size, 1050.0);

    let rows = store.rows("MVLC");
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0].status.as_deref(), Some("available"));
    assert_eq!(rows[1].category.as_deref(), Some("prime"));
    assert_eq!(rows[2].status.as_deref(), Some("reserved"));
    assert_eq!(rows[2].category.as_deref(), Some("commercial"));
    assert_eq!(rows[2].last_updated.as_deref(), Some("2024-03-05"));
    assert_eq!(rows[2].user_id.as_deref(), Some("agent-1"));
}

#[test]
fn test_reimport_updates_instead_of_duplicating() {
    let dir = TempDir::new().unwrap();
    let store = MemoryStore::signed_in("agent-1");
    let ws = workspace(&dir, Some(&store));

    ws.import_text("MVLC", UPLOAD).unwrap();
    let first = ws.inventory("MVLC").unwrap();
    let second = ws.import_text("MVLC", UPLOAD).unwrap();

    assert_eq!(second.counts, MergeCounts { updated: 3, inserted: 0 });
    assert_eq!(second.remote, RemoteSync::Completed { updated: 3, inserted: 0 });
    assert_eq!(ws.inventory("MVLC").unwrap(), first);
    assert_eq!(store.rows("MVLC").len(), 3);
}

#[test]
fn test_remote_failure_keeps_local_state_and_earlier_upserts() {
    let dir = TempDir::new().unwrap();
    let store = MemoryStore::signed_in("agent-1");
    store.fail_upsert_at(1);
    let ws = workspace(&dir, Some(&store));

    let report = ws.import_text("MVLC", UPLOAD).unwrap();

    assert!(matches!(report.remote, RemoteSync::Failed { completed: 1, .. }));
    assert_eq!(ws.inventory("MVLC").unwrap().len(), 3);
    let written: Vec<String> = store.rows("MVLC").into_iter().map(|row| row.lot_no).collect();
    assert_eq!(written, vec!["A-1"]);
}

#[test]
fn test_without_session_only_local_inventory_changes() {
    let dir = TempDir::new().unwrap();
    let store = MemoryStore::new();
    let ws = workspace(&dir, Some(&store));

    let report = ws.import_text("SRH", UPLOAD).unwrap();

    assert_eq!(report.remote, RemoteSync::Skipped);
    assert!(store.rows("SRH").is_empty());
    assert_eq!(ws.inventory("SRH").unwrap().len(), 3);
}

#[test]
fn test_import_file_by_extension() {
    let dir = TempDir::new().unwrap();
    let ws = workspace(&dir, None);

    let csv_path = dir.path().join("upload.csv");
    fs::write(
        &csv_path,
        "\u{FEFF}Lot No;Phase;Lot Area;Status\r\nC-1;2-PC;200;Sold\r\nC-2;2;150;Open\r\n",
    )
    .unwrap();
    let report = ws.import_file("SRH", &csv_path).unwrap();
    assert_eq!(report.counts.inserted, 2);
    assert_eq!(report.merged[0].category, "Prime Corner");
    assert_eq!(report.merged[0].status, "Sold");

    let pdf_path = dir.path().join("upload.pdf");
    fs::write(&pdf_path, "%PDF").unwrap();
    assert!(matches!(
        ws.import_file("SRH", &pdf_path),
        Err(AppError::UnsupportedFormat(_))
    ));

    let empty_path = dir.path().join("empty.csv");
    fs::write(&empty_path, "").unwrap();
    assert!(matches!(
        ws.import_file("SRH", &empty_path),
        Err(AppError::EmptyInput)
    ));

    assert!(matches!(
        ws.import_file("SRH", &dir.path().join("missing.csv")),
        Err(AppError::Io { .. })
    ));
}

#[test]
fn test_import_xlsx_workbook() {
    let dir = TempDir::new().unwrap();
    let ws = workspace(&dir, None);
    let fixture = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/inventory.xlsx");

    let report = ws.import_file("SRH", &fixture).unwrap();

    assert_eq!(report.batch.header_row, 0);
    assert_eq!(report.counts, MergeCounts { updated: 0, inserted: 2 });

    let inventory = ws.inventory("SRH").unwrap();
    let first = inventory.get("X-1", Some(1)).unwrap();
    assert_eq!(first.size, 150.0);
    assert_eq!(first.category, "Prime");
    assert_eq!(first.status, "Open");

    let second = inventory.get("X-2", Some(2)).unwrap();
    assert_eq!(second.size, 80.5);
    assert_eq!(second.category, "Regular Corner");
    assert_eq!(second.status, "Sold");
}

#[test]
fn test_status_change() {
    let dir = TempDir::new().unwrap();
    let store = MemoryStore::signed_in("agent-1");
    let ws = workspace(&dir, Some(&store));
    ws.import_text("MVLC", UPLOAD).unwrap();

    let change = ws
        .update_lot_status("MVLC", "a-2", Some(2), "SOLD", day())
        .unwrap();
    assert_eq!(change.record.status, "sold");
    assert_eq!(change.record.last_updated.as_deref(), Some("2026-10-18"));
    assert_eq!(change.remote, RemoteSync::Completed { updated: 1, inserted: 0 });

    let cached = ws.inventory("MVLC").unwrap();
    assert_eq!(cached.get("A-2", Some(2)).unwrap().status, "sold");
    let remote = store.fetch_lots("MVLC").unwrap();
    assert_eq!(remote[1].status, "sold");

    let fallback = ws
        .update_lot_status("MVLC", "A-1", Some(1), "on hold", day())
        .unwrap();
    assert_eq!(fallback.record.status, "available");

    assert!(matches!(
        ws.update_lot_status("MVLC", "Z-9", Some(1), "sold", day()),
        Err(AppError::LotNotFound { .. })
    ));
}

#[test]
fn test_phase_prices_for_legacy_scope() {
    let dir = TempDir::new().unwrap();
    let store = MemoryStore::signed_in("agent-1");
    let ws = workspace(&dir, Some(&store));
    ws.import_text("MVLC", UPLOAD).unwrap();

    let prices: PriceMap = [
        ("Regular Corner".to_string(), 2000.0),
        ("commercial".to_string(), 3000.0),
        ("prime".to_string(), 2500.0),
    ]
    .into_iter()
    .collect();
    let report = ws
        .save_category_prices("MVLC", Some("phase13"), &prices)
        .unwrap();

    assert_eq!(report.scopes, vec!["MVLC_phase1", "MVLC_phase3"]);
    assert_eq!(report.priced, 2);
    assert_eq!(report.remote, RemoteSync::Completed { updated: 2, inserted: 0 });

    let inventory = ws.inventory("MVLC").unwrap();
    assert_eq!(inventory.get("A-1", Some(1)).unwrap().total, Some(240_000.0));
    assert_eq!(inventory.get("B-7", Some(3)).unwrap().total, Some(3_150_000.0));
    assert_eq!(inventory.get("A-2", Some(2)).unwrap().price_per_sqm, None);

    let phase3 = PriceScope::phase("MVLC", PhaseGroup::Phase3);
    assert_eq!(ws.cache().load_prices(&phase3).unwrap().get("commercial"), Some(&3000.0));
    assert_eq!(
        store.fetch_prices(&phase3).unwrap().unwrap().commercial,
        Some(3000.0)
    );

    assert!(matches!(
        ws.save_category_prices("MVLC", None, &prices),
        Err(AppError::UnknownScope(_))
    ));
}

#[test]
fn test_prices_saved_locally_without_session() {
    let dir = TempDir::new().unwrap();
    let ws = workspace(&dir, None);
    ws.import_text("SRH", UPLOAD).unwrap();

    let prices: PriceMap = [("prime".to_string(), 1000.0)].into_iter().collect();
    let report = ws.save_category_prices("SRH", None, &prices).unwrap();

    assert_eq!(report.scopes, vec!["SRH"]);
    assert_eq!(report.remote, RemoteSync::Skipped);
    assert!(report.summary().ends_with("(local only)"));

    let reimport = ws.import_text("SRH", UPLOAD).unwrap();
    let prime = reimport
        .merged
        .iter()
        .find(|lot| lot.lot_number == "A-2")
        .unwrap();
    assert_eq!(prime.total, Some(90_000.0));
}

#[test]
fn test_reimport_keeps_totals_consistent_with_prices() {
    let dir = TempDir::new().unwrap();
    let ws = workspace(&dir, None);
    ws.import_text("SRH", "Lot,Phase,Size,Status,Category\nA-1,1,100,Sold,Regular\n")
        .unwrap();
    let prices: PriceMap = [("regular".to_string(), 1000.0)].into_iter().collect();
    ws.save_category_prices("SRH", None, &prices).unwrap();
    assert_eq!(ws.summary("SRH").unwrap().revenue, 100_000.0);

    ws.import_text("SRH", "Lot,Phase,Size,Status,Category\nA-1,1,200,Sold,Golf View\n")
        .unwrap();
    let moved = ws.inventory("SRH").unwrap().get("A-1", Some(1)).cloned().unwrap();
    assert_eq!(moved.category, "Golf View");
    assert_eq!(moved.price_per_sqm, None);
    assert_eq!(moved.total, None);
    assert_eq!(ws.summary("SRH").unwrap().revenue, 0.0);

    ws.import_text("SRH", "Lot,Phase,Size,Status,Category\nA-1,1,250,Sold,Regular\n")
        .unwrap();
    let back = ws.inventory("SRH").unwrap().get("A-1", Some(1)).cloned().unwrap();
    assert_eq!(back.price_per_sqm, Some(1000.0));
    assert_eq!(back.total, Some(250_000.0));
    assert_eq!(ws.summary("SRH").unwrap().revenue, 250_000.0);
}

#[test]
fn test_listing_summary_and_clear() {
    let dir = TempDir::new().unwrap();
    let store = MemoryStore::signed_in("agent-1");
    let ws = workspace(&dir, Some(&store));
    ws.import_text("MVLC", UPLOAD).unwrap();

    let open = ws
        .list(
            "MVLC",
            &InventoryFilter {
                status: Some("available".to_string()),
                ..InventoryFilter::default()
            },
        )
        .unwrap();
    assert_eq!(open.len(), 1);
    assert_eq!(open[0].lot_number, "A-1");

    let summary = ws.summary("MVLC").unwrap();
    assert_eq!(summary.available, 1);
    assert_eq!(summary.reserved, 1);
    assert_eq!(summary.sold, 1);

    assert_eq!(ws.clear_inventory("MVLC").unwrap(), 3);
    assert!(ws.inventory("MVLC").unwrap().is_empty());
    assert!(store.rows("MVLC").is_empty());
}

#[test]
fn test_pull_remote_folds_rows_into_cache() {
    let dir = TempDir::new().unwrap();
    let store = MemoryStore::signed_in("agent-1");
    let producer = workspace(&dir, Some(&store));
    producer.import_text("MVLC", UPLOAD).unwrap();

    let other_dir = TempDir::new().unwrap();
    let consumer = workspace(&other_dir, Some(&store));
    let pulled = consumer.pull_remote("MVLC").unwrap();

    assert_eq!(pulled.len(), 3);
    assert_eq!(pulled.get("A-1", Some(1)).unwrap().status, "available");
    assert_eq!(consumer.inventory("MVLC").unwrap(), pulled);
}
