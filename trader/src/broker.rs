//! Venue connection used by the trader runtime.

use contractbook_broker::deriv::DerivBroker;
use contractbook_broker::{Broker, BrokerError};
use log::info;

use crate::config::Config;
use crate::error::{Error, Result};

pub type BrokerResult<T> = std::result::Result<T, BrokerError>;

pub fn as_connection_error<T>(result: BrokerResult<T>) -> Result<T> {
    result.map_err(|e| Error::Connection(e.to_string()))
}

/// Venue refusals of a purchase become [`Error::Rejected`]; everything else
/// is a connection problem.
pub fn as_purchase_error<T>(result: BrokerResult<T>) -> Result<T> {
    result.map_err(|e| match e {
        BrokerError::Api { code, message } => Error::Rejected(format!("{code}: {message}")),
        other => Error::Connection(other.to_string()),
    })
}

/// Build the Deriv broker from config. Not yet connected.
pub fn deriv_broker(config: &Config) -> Result<Box<dyn Broker>> {
    let client = config.client_config()?;
    info!("Using {} (app_id {})", client.endpoint, client.app_id);
    Ok(Box::new(DerivBroker::new(client)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_errors_are_rejections() {
        let result: BrokerResult<()> = Err(BrokerError::Api {
            code: "InsufficientBalance".into(),
            message: "Balance too low.".into(),
        });
        match as_purchase_error(result) {
            Err(Error::Rejected(msg)) => assert_eq!(msg, "InsufficientBalance: Balance too low."),
            other => panic!("expected rejection, got {other:?}"),
        }
    }

    #[test]
    fn transport_errors_are_connection_errors() {
        let result: BrokerResult<()> = Err(BrokerError::Timeout("read".into()));
        assert!(matches!(as_purchase_error(result), Err(Error::Connection(_))));
        let result: BrokerResult<()> = Err(BrokerError::NotConnected);
        assert!(matches!(as_connection_error(result), Err(Error::Connection(_))));
    }
}
