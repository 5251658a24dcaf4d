//! Database seeder for Cuadra development and testing.
//!
//! Seeds a demo register with an open session, a few ledger entries, and the
//! settled sales and operating expenses the closing summary reads.
//!
//! Usage:
//!   seeder                 - Seed demo data
//!   seeder reset <scope>   - Delete rows; scope is `ledger-entries`, `sessions` or `all`

use std::process::ExitCode;
use std::sync::Arc;

use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set};
use uuid::Uuid;

use cuadra_core::register::{
    EntryKind, OpenSessionInput, PurgeScope, RecordEntryInput, RegisterError, RegisterService,
    RegisterSettings, RegisterSession,
};
use cuadra_db::entities::{operating_expenses, settled_sales};
use cuadra_db::{RegisterRepository, SalesFeedRepository};

/// Register the demo data is attached to.
const DEMO_REGISTER: &str = "caja-principal";

type Service = RegisterService<RegisterRepository, SalesFeedRepository>;

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    let Ok(database_url) = std::env::var("DATABASE_URL") else {
        eprintln!("DATABASE_URL must be set in environment");
        return ExitCode::FAILURE;
    };

    println!("Connecting to database...");
    let db = match cuadra_db::connect(&database_url).await {
        Ok(db) => db,
        Err(e) => {
            eprintln!("Failed to connect to database: {e}");
            return ExitCode::FAILURE;
        }
    };

    let service = RegisterService::new(
        Arc::new(RegisterRepository::new(db.clone())),
        Arc::new(SalesFeedRepository::new(db.clone())),
        RegisterSettings::default(),
    );

    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.first().map(String::as_str) {
        None | Some("seed") => seed(&db, &service).await,
        Some("reset") => reset(&service, args.get(1).map(String::as_str)).await,
        Some(other) => {
            eprintln!("Unknown command: {other}. Expected `seed` or `reset <scope>`");
            ExitCode::FAILURE
        }
    }
}

/// Deletes every row of the given scope.
async fn reset(service: &Service, scope: Option<&str>) -> ExitCode {
    let scope = match scope.unwrap_or("all").parse::<PurgeScope>() {
        Ok(scope) => scope,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };

    match service.purge(scope).await {
        Ok(report) => {
            println!(
                "Deleted {} sessions and {} ledger entries",
                report.sessions_deleted, report.entries_deleted
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Failed to purge register data: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn seed(db: &DatabaseConnection, service: &Service) -> ExitCode {
    println!("Seeding demo session...");
    let session = match seed_session(service).await {
        Ok(session) => session,
        Err(e) => {
            eprintln!("Failed to seed demo session: {e}");
            return ExitCode::FAILURE;
        }
    };

    println!("Seeding ledger entries...");
    seed_entries(service, &session).await;

    println!("Seeding settled sales and operating expenses...");
    seed_feed(db, &session).await;

    println!("Seeding complete! Session {} on {DEMO_REGISTER}", session.id);
    ExitCode::SUCCESS
}

/// Opens the demo session, or reuses the one already open.
async fn seed_session(service: &Service) -> Result<RegisterSession, RegisterError> {
    let hint = service.opening_hint(DEMO_REGISTER).await?;
    if let Some(id) = hint.open_session_id {
        println!("  Demo register already has an open session, reusing it...");
        return service.get_session(id).await;
    }

    let session = service
        .open_session(OpenSessionInput {
            register_id: DEMO_REGISTER.to_string(),
            name: "Turno mañana".to_string(),
            responsible: "demo".to_string(),
            opening_float_breakdown: hint
                .suggested_breakdown
                .into_iter()
                .map(|(method, amount)| (method.as_str().to_string(), amount))
                .collect(),
            declared_opening_float: Some(hint.suggested_float),
            cashiers: vec!["demo".to_string()],
            notes: Some("Sesión de demostración".to_string()),
        })
        .await?;
    println!("  Opened session with float {}", session.opening_float);
    Ok(session)
}

async fn seed_entries(service: &Service, session: &RegisterSession) {
    let entries = [
        (EntryKind::Income, dec!(50000), "cash", "Base adicional"),
        (EntryKind::Expense, dec!(12000), "cash", "Compra de hielo"),
        (EntryKind::Expense, dec!(8000), "transfer", "Domicilio"),
    ];

    for (kind, amount, method, description) in entries {
        let input = RecordEntryInput {
            kind,
            amount,
            payment_method: method.to_string(),
            description: Some(description.to_string()),
            recorded_by: Some("demo".to_string()),
        };
        match service.record_entry(session.id, input).await {
            Ok(_) => println!("  Recorded {description}"),
            Err(e) => eprintln!("Failed to record {description}: {e}"),
        }
    }
}

async fn seed_feed(db: &DatabaseConnection, session: &RegisterSession) {
    let at = session.opened_at.max(Utc::now() - Duration::minutes(1));
    let sales: [(Option<&str>, Decimal); 4] = [
        (Some("cash"), dec!(185000)),
        (Some("card"), dec!(240500)),
        (Some("transfer"), dec!(96000)),
        (None, dec!(15000)),
    ];

    for (method, amount) in sales {
        let sale = settled_sales::ActiveModel {
            id: Set(Uuid::now_v7()),
            register_id: Set(DEMO_REGISTER.to_string()),
            payment_method: Set(method.map(str::to_string)),
            amount: Set(amount),
            settled_at: Set(at.into()),
        };
        if let Err(e) = sale.insert(db).await {
            eprintln!("Failed to insert settled sale: {e}");
        }
    }

    let expense = operating_expenses::ActiveModel {
        id: Set(Uuid::now_v7()),
        register_id: Set(DEMO_REGISTER.to_string()),
        payment_method: Set(Some("cash".to_string())),
        amount: Set(dec!(30000)),
        description: Set(Some("Pago proveedor de verduras".to_string())),
        paid_at: Set(at.into()),
    };
    if let Err(e) = expense.insert(db).await {
        eprintln!("Failed to insert operating expense: {e}");
    }
}
