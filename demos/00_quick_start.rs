/// quick start - minimal example to get started
use installment_loan_rs::serialization::{to_json_pretty, ScheduleView};
use installment_loan_rs::{InMemoryStore, LedgerConfig, LoanLedger, Money, Rate};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let ledger = LoanLedger::with_system_time(InMemoryStore::new(), LedgerConfig::default())?;

    // a $1,200 loan at 12% over a year
    let owner = ledger.register_user("ana")?;
    let loan = ledger.create_loan(owner.id, Money::from_major(1_200), Rate::from_percentage(12), 12)?;

    let schedule = ledger.get_schedule(loan.id, owner.id)?;
    println!("{}", to_json_pretty(&ScheduleView::from_schedule(loan.id, &schedule))?);

    let summary = ledger.get_loan_summary(loan.id, 6, owner.id)?;
    println!(
        "after month 6: balance {}, principal paid {}, interest paid {}",
        summary.current_principal_balance,
        summary.aggregate_principal_paid,
        summary.aggregate_interest_paid
    );

    Ok(())
}
