/// sharing - owners grant and revoke read access
use installment_loan_rs::serialization::{to_json_pretty, LoanView};
use installment_loan_rs::{
    ErrorKind, InMemoryStore, LedgerConfig, LoanLedger, Money, Rate, SafeTimeProvider, TimeSource,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("debug")),
        )
        .with_target(true)
        .init();

    let time = SafeTimeProvider::new(TimeSource::Test("2024-01-01T00:00:00Z".parse()?));
    let ledger = LoanLedger::new(InMemoryStore::new(), LedgerConfig::default(), time)?;

    let ana = ledger.register_user("ana")?;
    let ben = ledger.register_user("ben")?;
    let cy = ledger.register_user("cy")?;

    let loan = ledger.create_loan(ana.id, Money::from_major(10_000), Rate::from_percentage(5), 120)?;

    // ben can't see it until ana shares it
    let denied = ledger.get_schedule(loan.id, ben.id).unwrap_err();
    println!("ben before share: {} ({:?})", denied, denied.kind());

    ledger.share_loan(ana.id, loan.id, ben.id)?;
    let month = ledger.get_month_summary(loan.id, 24, ben.id)?;
    println!("ben sees month 24: remaining {}", month.remaining_balance);

    // only the owner shares
    let err = ledger.share_loan(ben.id, loan.id, cy.id).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotOwner);

    for visible in ledger.list_loans_for(ben.id)? {
        println!("{}", to_json_pretty(&LoanView::from_visible(&visible))?);
    }

    ledger.revoke_share(ana.id, loan.id, ben.id)?;
    println!("ben after revoke: {}", ledger.list_loans_for(ben.id)?.len());

    for event in ledger.take_events() {
        println!("{:?}", event);
    }

    Ok(())
}
