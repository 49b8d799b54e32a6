mod common;

use std::sync::Arc;
use std::thread;

use anyhow::Result;
use chrono::{Duration, Local};
use common::service_with_customer;
use finapi::application::{AppError, LedgerService};
use finapi::domain::OperationKind;

#[test]
fn test_deposits_sum_to_balance() -> Result<()> {
    let (service, handle) = service_with_customer(111, "Ana")?;
    let amounts = [1000, 250, 1, 0, 98765];

    for amount in amounts {
        service.deposit(&handle, "deposit".into(), amount)?;
    }

    assert_eq!(service.balance(&handle)?, amounts.iter().sum::<i64>());
    Ok(())
}

#[test]
fn test_balance_is_credits_minus_debits() -> Result<()> {
    let (service, handle) = service_with_customer(111, "Ana")?;

    service.deposit(&handle, "salary".into(), 5000)?;
    service.withdraw(&handle, 1200)?;
    service.deposit(&handle, "bonus".into(), 800)?;
    service.withdraw(&handle, 3000)?;
    service.withdraw(&handle, 600)?;

    assert_eq!(service.balance(&handle)?, 5800 - 4800);

    let statement = service.statement(&handle)?;
    let kinds: Vec<OperationKind> = statement.iter().map(|op| op.kind).collect();
    assert_eq!(
        kinds,
        vec![
            OperationKind::Credit,
            OperationKind::Debit,
            OperationKind::Credit,
            OperationKind::Debit,
            OperationKind::Debit,
        ]
    );
    Ok(())
}

#[test]
fn test_withdraw_fails_only_above_balance() -> Result<()> {
    let (service, handle) = service_with_customer(111, "Ana")?;
    service.deposit(&handle, "salary".into(), 1000)?;

    let err = service.withdraw(&handle, 1001).unwrap_err();
    assert!(matches!(err, AppError::InsufficientFunds { balance: 1000, required: 1001, .. }));
    assert_eq!(service.balance(&handle)?, 1000);

    service.withdraw(&handle, 400)?;
    assert_eq!(service.balance(&handle)?, 600);

    service.withdraw(&handle, 600)?;
    assert_eq!(service.balance(&handle)?, 0);
    Ok(())
}

#[test]
fn test_salary_scenario() -> Result<()> {
    let (service, ana) = service_with_customer(111, "Ana")?;

    service.deposit(&ana, "salary".into(), 1000)?;
    service.withdraw(&ana, 300)?;

    assert_eq!(service.balance(&ana)?, 700);
    Ok(())
}

#[test]
fn test_withdraw_on_empty_account() -> Result<()> {
    let (service, handle) = service_with_customer(222, "Bia")?;

    let result = service.withdraw(&handle, 50);

    assert!(matches!(result, Err(AppError::InsufficientFunds { .. })));
    assert_eq!(service.balance(&handle)?, 0);
    Ok(())
}

#[test]
fn test_duplicate_open_keeps_first_name() -> Result<()> {
    let service = LedgerService::new();
    service.open(333, "Caio".into())?;

    let result = service.open(333, "Someone Else".into());

    assert_eq!(result, Err(AppError::CustomerAlreadyExists(333)));
    let customer = service.account(&service.lookup(333)?)?;
    assert_eq!(customer.name, "Caio");
    Ok(())
}

#[test]
fn test_lookup_unknown_customer() {
    let service = LedgerService::new();
    assert_eq!(
        service.lookup(404).unwrap_err(),
        AppError::CustomerNotFound(404)
    );
}

#[test]
fn test_rename_changes_name_only() -> Result<()> {
    let (service, handle) = service_with_customer(111, "Ana")?;
    service.deposit(&handle, "salary".into(), 1000)?;
    let before = service.account(&handle)?;

    service.rename(&handle, "Ana Maria".into())?;

    let after = service.account(&handle)?;
    assert_eq!(after.name, "Ana Maria");
    assert_eq!(after.id, before.id);
    assert_eq!(after.tax_id, before.tax_id);
    assert_eq!(after.statement, before.statement);
    Ok(())
}

#[test]
fn test_close_returns_remaining_customers() -> Result<()> {
    let service = LedgerService::new();
    service.open(1, "One".into())?;
    service.open(2, "Two".into())?;
    service.open(3, "Three".into())?;
    let two = service.lookup(2)?;
    service.deposit(&two, "gone soon".into(), 500)?;

    let remaining = service.close(&two)?;

    let names: Vec<&str> = remaining.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["One", "Three"]);
    assert!(service.lookup(2).is_err());

    // Reopening starts from an empty statement
    service.open(2, "Two again".into())?;
    assert_eq!(service.balance(&service.lookup(2)?)?, 0);
    Ok(())
}

#[test]
fn test_statement_by_date() -> Result<()> {
    let (service, handle) = service_with_customer(111, "Ana")?;
    service.deposit(&handle, "salary".into(), 1000)?;
    service.withdraw(&handle, 300)?;

    let today = Local::now().date_naive();
    let todays = service.statement_by_date(&handle, today)?;
    let yesterdays = service.statement_by_date(&handle, today - Duration::days(1))?;

    assert_eq!(todays, service.statement(&handle)?);
    assert!(yesterdays.is_empty());
    Ok(())
}

#[test]
fn test_statement_timestamps_non_decreasing() -> Result<()> {
    let (service, handle) = service_with_customer(111, "Ana")?;
    for i in 0..50 {
        service.deposit(&handle, format!("deposit {i}"), 10)?;
    }

    let statement = service.statement(&handle)?;
    assert!(statement
        .windows(2)
        .all(|pair| pair[0].created_at <= pair[1].created_at));
    Ok(())
}

#[test]
fn test_negative_deposit_rejected() -> Result<()> {
    let (service, handle) = service_with_customer(111, "Ana")?;

    assert_eq!(
        service.deposit(&handle, "bad".into(), -5),
        Err(AppError::InvalidAmount(-5))
    );
    assert!(service.statement(&handle)?.is_empty());
    Ok(())
}

#[test]
fn test_parallel_withdrawals_on_separate_accounts() -> Result<()> {
    let service = Arc::new(LedgerService::new());
    for tax_id in 1..=4 {
        service.open(tax_id, format!("customer {tax_id}"))?;
        service.deposit(&service.lookup(tax_id)?, "seed".into(), 500)?;
    }

    let workers: Vec<_> = (1..=4)
        .flat_map(|tax_id| {
            (0..10).map(move |_| tax_id)
        })
        .map(|tax_id| {
            let service = Arc::clone(&service);
            thread::spawn(move || -> Result<bool> {
                let handle = service.lookup(tax_id)?;
                Ok(service.withdraw(&handle, 100).is_ok())
            })
        })
        .collect();

    let mut succeeded = 0;
    for worker in workers {
        if worker.join().expect("worker panicked")? {
            succeeded += 1;
        }
    }

    assert_eq!(succeeded, 4 * 5);
    for tax_id in 1..=4 {
        assert_eq!(service.balance(&service.lookup(tax_id)?)?, 0);
    }
    Ok(())
}
