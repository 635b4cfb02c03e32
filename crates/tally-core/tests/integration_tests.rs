//! Integration tests for tally-core
//!
//! These tests exercise the full import → sweep → insights workflow against
//! an in-memory SQLite ledger seeded with the default rules.

use tally_core::{
    config::Config,
    db::Database,
    detect::RecurrenceDetector,
    insights::{InsightsAnalyzer, SummaryFilter},
    ledger::{LedgerRepository, RuleSource},
    models::{AccountType, BudgetKind},
    pipeline::{recategorize_ledger, redetect_ledger, ImportPipeline, ImportReport},
    Error,
};

/// Two months of a personal account:
/// - NETFLIX three times on the 1st (a monthly series)
/// - weekly CARREFOUR groceries with one very large basket
/// - two bank fee lines, one salary, one uncategorizable bakery
fn statement() -> &'static str {
    "Date operation;Date de valeur;Libelle operation;Libelle simplifie;Debit;Credit
01/01/2024;01/01/2024;PRLV SEPA NETFLIX;NETFLIX;-13,49;
01/02/2024;01/02/2024;PRLV SEPA NETFLIX;NETFLIX;-13,49;
01/03/2024;01/03/2024;PRLV SEPA NETFLIX;NETFLIX;-13,49;
05/01/2024;05/01/2024;CB CARREFOUR MARKET;CARREFOUR;-54,20;
12/01/2024;12/01/2024;CB CARREFOUR CITY;CARREFOUR;-48,90;
19/01/2024;19/01/2024;CB CARREFOUR MARKET;CARREFOUR;-61,30;
26/01/2024;26/01/2024;CB CARREFOUR MARKET;CARREFOUR;-52,10;
02/02/2024;02/02/2024;CB CARREFOUR MARKET;CARREFOUR;-57,40;
09/02/2024;09/02/2024;CB CARREFOUR CITY;CARREFOUR;-49,80;
16/02/2024;16/02/2024;CB CARREFOUR MARKET;CARREFOUR;-55,00;
23/02/2024;23/02/2024;CB CARREFOUR MARKET;CARREFOUR;-350,00;
31/01/2024;31/01/2024;COTISATIONS BANCAIRES CARTE;COTISATION;-7,50;
29/02/2024;29/02/2024;FRAIS BANCAIRES TENUE DE COMPTE;FRAIS;-2,00;
28/01/2024;28/01/2024;VIREMENT SALAIRE ACME;ACME;;+2500,00
15/02/2024;15/02/2024;CB BOULANGERIE DU COIN;BOULANGERIE;-4,20;
"
}

fn setup() -> (Database, Config) {
    let db = Database::in_memory().expect("Failed to create in-memory database");
    let config = Config::embedded().expect("Embedded config should parse");
    db.seed_rules(&config.rules).expect("Failed to seed rules");
    (db, config)
}

fn import(db: &Database, config: &Config, data: &[u8]) -> ImportReport {
    ImportPipeline::new(config)
        .import_reader(data, AccountType::Perso, db, db)
        .expect("Import failed")
}

// =============================================================================
// Import
// =============================================================================

#[test]
fn test_full_import_workflow() {
    let (db, config) = setup();

    let report = import(&db, &config, statement().as_bytes());
    assert_eq!(report.parsed, 15);
    assert_eq!(report.inserted, 15);
    assert_eq!(report.categorized, 14);
    assert_eq!(report.recurring, 3);

    let records = db.get_all().unwrap();
    let netflix: Vec<_> = records
        .iter()
        .filter(|r| r.simplified_label == "NETFLIX")
        .collect();
    assert_eq!(netflix.len(), 3);
    for r in &netflix {
        assert_eq!(r.category.as_deref(), Some("Loisirs"));
        assert_eq!(r.budget_kind, BudgetKind::Recurring);
        assert_eq!(r.amount, -13.49);
    }

    let salary = records
        .iter()
        .find(|r| r.simplified_label == "ACME")
        .unwrap();
    assert_eq!(salary.amount, 2500.0);
    assert_eq!(salary.category.as_deref(), Some("Salaire"));
}

#[test]
fn test_reimport_is_idempotent() {
    let (db, config) = setup();

    import(&db, &config, statement().as_bytes());
    let second = import(&db, &config, statement().as_bytes());

    assert_eq!(second.inserted, 0);
    assert_eq!(second.duplicates, 15);
    assert_eq!(db.count_transactions().unwrap(), 15);
}

#[test]
fn test_reimport_with_different_casing_and_padding() {
    let (db, config) = setup();
    import(&db, &config, statement().as_bytes());

    // Same lines exported with other header spelling and label padding
    let variant = "DATE_OPERATION;libellé opération;Débit;Crédit\n\
                   01/01/2024;prlv sepa  netflix ;-13,49;\n\
                   28/01/2024;Virement Salaire Acme;;+2500,00\n";
    let report = import(&db, &config, variant.as_bytes());
    assert_eq!(report.parsed, 2);
    assert_eq!(report.inserted, 0);
}

#[test]
fn test_latin1_statement() {
    let (db, config) = setup();

    let data: &[u8] = b"Date op\xe9ration;Libell\xe9 op\xe9ration;D\xe9bit;Cr\xe9dit\n\
                        03/04/2024;CB PHARMACIE DU MARCH\xc9;-12,50;\n";
    let report = import(&db, &config, data);
    assert_eq!(report.inserted, 1);

    let record = &db.get_all().unwrap()[0];
    assert_eq!(record.raw_label, "CB PHARMACIE DU MARCHÉ");
    assert_eq!(record.category.as_deref(), Some("Santé"));
    assert_eq!(record.amount, -12.5);
}

#[test]
fn test_empty_statement_is_reported() {
    let (db, config) = setup();
    let result = ImportPipeline::new(&config).import_reader(
        "Date operation;Libelle operation;Debit;Credit\n".as_bytes(),
        AccountType::Perso,
        &db,
        &db,
    );
    assert!(matches!(result, Err(Error::EmptyInput(_))));
    assert_eq!(db.count_transactions().unwrap(), 0);
}

// =============================================================================
// Re-sweeps
// =============================================================================

#[test]
fn test_rule_change_sweep() {
    let (db, config) = setup();
    import(&db, &config, statement().as_bytes());

    db.add_category("Boulangerie").unwrap();
    db.add_rule("Boulangerie", "BOULANGERIE").unwrap();
    assert_eq!(db.get_rules().unwrap().len(), 12);

    let changes = recategorize_ledger(&db, &db, &config.categorization).unwrap();
    assert_eq!(changes.len(), 1);
    assert_eq!(changes[0].category, "Boulangerie");

    let bakery = db.get_record(&changes[0].fingerprint).unwrap().unwrap();
    assert_eq!(bakery.category.as_deref(), Some("Boulangerie"));
    assert_eq!(bakery.sub_category.as_deref(), Some(""));

    // No rule change, nothing to do
    assert!(recategorize_ledger(&db, &db, &config.categorization)
        .unwrap()
        .is_empty());
}

#[test]
fn test_redetect_across_statements() {
    let (db, config) = setup();
    let january = "Date operation;Libelle operation;Libelle simplifie;Debit\n\
                   10/01/2024;PRLV FREE MOBILE;FREE MOBILE;-19,99\n";
    let february = "Date operation;Libelle operation;Libelle simplifie;Debit\n\
                    10/02/2024;PRLV FREE MOBILE;FREE MOBILE;-19,99\n";
    let march = "Date operation;Libelle operation;Libelle simplifie;Debit\n\
                 11/03/2024;PRLV FREE MOBILE;FREE MOBILE;-20,49\n";
    for data in [january, february, march] {
        import(&db, &config, data.as_bytes());
    }
    assert!(db
        .get_all()
        .unwrap()
        .iter()
        .all(|r| r.budget_kind == BudgetKind::Punctual));

    let detector = RecurrenceDetector::with_config(config.detection.clone());
    let changes = redetect_ledger(&db, &detector).unwrap();
    assert_eq!(changes.len(), 3);

    let subscriptions = InsightsAnalyzer::with_config(config.insights.clone())
        .subscriptions(&db.get_all().unwrap());
    assert_eq!(subscriptions.len(), 1);
    assert_eq!(subscriptions[0].label, "FREE MOBILE");
    assert_eq!(subscriptions[0].payments, 3);
}

// =============================================================================
// Insights
// =============================================================================

#[test]
fn test_insights_over_ledger() {
    let (db, config) = setup();
    import(&db, &config, statement().as_bytes());

    let analyzer = InsightsAnalyzer::with_config(config.insights.clone());
    let report = analyzer.analyze_all(&db.get_all().unwrap());

    assert_eq!(report.subscriptions.len(), 1);
    assert_eq!(report.subscriptions[0].label, "NETFLIX");
    assert_eq!(report.subscriptions[0].payments, 3);

    assert_eq!(report.outliers.len(), 1);
    assert_eq!(report.outliers[0].category, "Courses");
    assert_eq!(report.outliers[0].amount, 350.0);

    assert_eq!(report.fees.rows.len(), 2);
    assert_eq!(report.fees.total, 9.5);
}

#[test]
fn test_fee_isolation_round_trip() {
    let (db, config) = setup();
    import(&db, &config, statement().as_bytes());

    let records = db.get_all().unwrap();
    let fees = InsightsAnalyzer::with_config(config.insights.clone()).fees(&records);

    let mut expected: Vec<_> = records
        .iter()
        .filter(|r| r.category.as_deref() == Some("Frais Bancaires"))
        .map(|r| r.fingerprint.clone())
        .collect();
    let mut isolated: Vec<_> = fees.rows.iter().map(|r| r.fingerprint.clone()).collect();
    expected.sort();
    isolated.sort();
    assert_eq!(isolated, expected);
    assert!(fees.rows.iter().all(|r| r.category == "Frais Bancaires"));
}

#[test]
fn test_summary_over_ledger() {
    let (db, config) = setup();
    import(&db, &config, statement().as_bytes());

    let analyzer = InsightsAnalyzer::with_config(config.insights.clone());
    let records = db.get_all().unwrap();
    let summary = analyzer.summary(&records, &SummaryFilter::default(), &config.categorization);

    assert_eq!(summary.transactions, 15);
    assert_eq!(summary.income, 2500.0);
    assert_eq!(summary.uncategorized, 1);
    assert_eq!(summary.by_category[0].category, "Courses");

    let february = SummaryFilter {
        from: chrono::NaiveDate::from_ymd_opt(2024, 2, 1),
        to: chrono::NaiveDate::from_ymd_opt(2024, 2, 29),
        ..Default::default()
    };
    let summary = analyzer.summary(&records, &february, &config.categorization);
    assert_eq!(summary.income, 0.0);
    assert_eq!(summary.transactions, 7);
}
