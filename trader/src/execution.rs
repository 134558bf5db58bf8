//! Session orchestrator: catalog → select → build → confirm → buy → settle.
//!
//! This is the main workflow that ties together all components.

use std::thread;
use std::time::{Duration, Instant};

use contractbook::{Catalog, ContractFilter, ContractView, DurationValue, PopulateReport};
use contractbook_broker::{Account, Broker, ContractId, ContractRequest, ContractStatus};
use log::{debug, info, warn};
use rustc_hash::FxHashSet;

use crate::broker::{as_connection_error, as_purchase_error};
use crate::config::Config;
use crate::contract;
use crate::error::{Error, Result};
use crate::journal::{self, Journal};
use crate::wizard::{self, Prompter};

/// Options for a trading session.
#[derive(Debug, Clone, Copy, Default)]
pub struct SessionOptions {
    /// Build the order but do not buy.
    pub dry_run: bool,
    /// Skip the confirmation prompt.
    pub force: bool,
}

/// How a session ended.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionOutcome {
    Cancelled,
    DryRun(ContractRequest),
    Declined(ContractRequest),
    Settled(ContractStatus),
}

impl SessionOutcome {
    fn label(&self) -> &'static str {
        match self {
            SessionOutcome::Cancelled => "cancelled",
            SessionOutcome::DryRun(_) => "dry_run",
            SessionOutcome::Declined(_) => "declined",
            SessionOutcome::Settled(_) => "settled",
        }
    }
}

/// Fetch both catalog responses and rebuild `catalog` from them.
pub fn load_catalog(broker: &dyn Broker, catalog: &mut Catalog) -> Result<PopulateReport> {
    let asset_index = as_connection_error(broker.asset_index())?;
    let active_symbols = as_connection_error(broker.active_symbols())?;
    let report = catalog.populate(&asset_index, &active_symbols)?;
    info!("Catalog loaded: {report}");
    Ok(report)
}

/// Poll a bought contract until it is sold or `timeout` elapses.
pub fn wait_for_settlement(
    broker: &dyn Broker,
    id: ContractId,
    interval: Duration,
    timeout: Duration,
) -> Result<ContractStatus> {
    let started = Instant::now();
    loop {
        let status = as_connection_error(broker.contract_status(id))?;
        if status.is_sold {
            return Ok(status);
        }
        debug!("Contract {id} still {} (profit {:.2})", status.status, status.profit);
        if started.elapsed() + interval > timeout {
            return Err(Error::SettlementTimeout {
                contract_id: id.0,
                waited_secs: started.elapsed().as_secs(),
            });
        }
        thread::sleep(interval);
    }
}

/// Run one interactive trading session against a connected-or-not broker.
///
/// The broker is connected at the start and disconnected at the end,
/// whatever the outcome.
pub fn run_session(
    config: &Config,
    broker: &mut dyn Broker,
    prompter: &mut dyn Prompter,
    journal: &mut Journal,
    opts: &SessionOptions,
) -> Result<SessionOutcome> {
    as_connection_error(broker.connect())?;
    let result = session(config, broker, prompter, journal, opts);
    if let Err(e) = broker.disconnect() {
        warn!("Disconnect failed: {e}");
    }

    let outcome = match &result {
        Ok(outcome) => outcome.label(),
        Err(Error::Rejected(_)) => "rejected",
        Err(Error::OrderRefused(_)) => "refused",
        Err(Error::SettlementTimeout { .. }) => "settlement_timeout",
        Err(_) => "failed",
    };
    journal::log_session_completed(journal, outcome)?;
    result
}

fn session(
    config: &Config,
    broker: &dyn Broker,
    prompter: &mut dyn Prompter,
    journal: &mut Journal,
    opts: &SessionOptions,
) -> Result<SessionOutcome> {
    // 1. Account
    let account = as_connection_error(broker.account())?;
    println!("{}", account_line(&account));
    journal::log_session_started(journal, &account)?;

    // 2. Catalog
    let mut catalog = Catalog::new();
    let report = load_catalog(broker, &mut catalog)?;
    journal::log_catalog_populated(journal, &report)?;

    // 3. Selection
    let Some(selection) = wizard::select_trade(&catalog, prompter)? else {
        println!("Cancelled.");
        return Ok(SessionOutcome::Cancelled);
    };
    journal::log_selection(journal, &selection)?;

    let contracts = contract::contracts_for(&selection.modality_group, &selection.modality_name)?;
    let Some(contract_type) = wizard::select_contract(contracts, prompter)? else {
        println!("Cancelled.");
        return Ok(SessionOutcome::Cancelled);
    };

    // 4. Order
    let duration = wizard::ask_duration(prompter, &config.default_duration()?)?;
    contract::check_duration(&catalog, &selection, &duration)?;
    let barriers = wizard::ask_barriers(prompter, contracts.barrier)?;
    let request = contract::build_request(
        &selection,
        contract_type,
        contracts.barrier,
        duration,
        barriers,
        &config.order,
    )?;
    journal::log_order_built(journal, &request)?;
    println!("\nORDER: {request}  (max price {:.2})", request.price_limit());

    if opts.dry_run {
        println!("[DRY RUN] Nothing bought.");
        return Ok(SessionOutcome::DryRun(request));
    }

    // 5. Confirm
    if !opts.force {
        let approved = prompter.confirm("Buy?", false)?;
        journal::log_user_confirmed(journal, approved)?;
        if !approved {
            println!("Aborted.");
            return Ok(SessionOutcome::Declined(request));
        }
    }

    // 6. Buy
    let purchase = as_purchase_error(broker.buy(&request))?;
    journal::log_contract_bought(journal, &purchase)?;
    println!(
        "Bought contract {} for {:.2} {}: {}",
        purchase.contract_id, purchase.buy_price, request.currency, purchase.longcode
    );

    // 7. Settle
    let status = wait_for_settlement(
        broker,
        purchase.contract_id,
        config.poll_interval(),
        config.poll_timeout(),
    )?;
    journal::log_contract_settled(journal, &account, &status)?;
    println!(
        "Contract {} {}: profit {:+.2} {}",
        status.contract_id, status.status, status.profit, request.currency
    );

    Ok(SessionOutcome::Settled(status))
}

/// Catalog filters taken from the command line.
#[derive(Debug, Clone, Default)]
pub struct ContractQuery {
    pub symbol: Option<String>,
    pub market: Option<String>,
    pub submarket: Option<String>,
    pub name: Option<String>,
    pub group: Option<String>,
    pub modality: Option<String>,
    pub duration: Option<String>,
    pub fit_in_units: bool,
}

impl ContractQuery {
    /// `None` when no filter is set.
    pub fn to_filter(&self) -> Result<Option<ContractFilter>> {
        let mut filter = ContractFilter::new().fit_in_units(self.fit_in_units);
        if let Some(s) = &self.symbol {
            filter = filter.symbol(s.as_str());
        }
        if let Some(m) = &self.market {
            filter = filter.market(m.as_str());
        }
        if let Some(s) = &self.submarket {
            filter = filter.submarket(s.as_str());
        }
        if let Some(n) = &self.name {
            filter = filter.display_name(n.as_str());
        }
        if let Some(g) = &self.group {
            filter = filter.modality_group(g.as_str());
        }
        if let Some(m) = &self.modality {
            filter = filter.modality_name(m.as_str());
        }
        if let Some(token) = &self.duration {
            filter = filter.duration(DurationValue::parse(token)?);
        }
        Ok((!filter.is_empty()).then_some(filter))
    }
}

/// Contracts matching `query`, or every available contract without a filter.
pub fn query_contracts<'a>(catalog: &'a Catalog, query: &ContractQuery) -> Result<Vec<ContractView<'a>>> {
    Ok(match query.to_filter()? {
        Some(filter) => catalog.find_matches(&filter),
        None => catalog.available_contracts(),
    })
}

/// Print matching contracts.
pub fn show_contracts(broker: &mut dyn Broker, query: &ContractQuery) -> Result<()> {
    let catalog = connected_catalog(broker)?;
    let contracts = query_contracts(&catalog, query)?;
    if contracts.is_empty() {
        println!("No matching contracts.");
        return Ok(());
    }
    for view in &contracts {
        println!("  {view}");
    }
    let symbols: FxHashSet<&str> = contracts.iter().map(|v| v.instrument.symbol()).collect();
    println!("\n{} contracts on {} symbols.", contracts.len(), symbols.len());
    Ok(())
}

/// Print every market and its submarkets with open/closed status.
pub fn show_markets(broker: &mut dyn Broker) -> Result<()> {
    let catalog = connected_catalog(broker)?;
    for market in catalog.markets_with_status() {
        println!("{} [{}]", market.display_name, open_label(market.is_open));
        for sub in catalog.submarkets_for(&market.code) {
            println!("  {} [{}]", sub.display_name, open_label(sub.is_open));
        }
    }
    Ok(())
}

/// Check the connection and print the account.
pub fn check_status(broker: &mut dyn Broker) -> Result<()> {
    as_connection_error(broker.connect())?;
    let account = as_connection_error(broker.account());
    if let Err(e) = broker.disconnect() {
        warn!("Disconnect failed: {e}");
    }
    println!("{}", account_line(&account?));
    Ok(())
}

// === Helpers ===

fn connected_catalog(broker: &mut dyn Broker) -> Result<Catalog> {
    as_connection_error(broker.connect())?;
    let mut catalog = Catalog::new();
    let result = load_catalog(broker, &mut catalog);
    if let Err(e) = broker.disconnect() {
        warn!("Disconnect failed: {e}");
    }
    result?;
    Ok(catalog)
}

fn open_label(is_open: bool) -> &'static str {
    if is_open { "open" } else { "closed" }
}

pub fn account_line(account: &Account) -> String {
    format!(
        "Account {} ({}): {:.2} {}",
        account.loginid,
        account.kind(),
        account.balance,
        account.currency
    )
}
