//! Price lookup with a deadline and a cancel signal

use crate::error::{CoreError, CoreResult};
use coinbook_market::MarketDataSource;
use std::time::Duration;
use tokio::sync::watch;

/// Sending side of a lookup's cancel signal
#[derive(Debug)]
pub struct CancelHandle(watch::Sender<bool>);

/// Receiving side, handed to `resolve_price`
#[derive(Debug, Clone)]
pub struct CancelSignal(watch::Receiver<bool>);

/// Create a connected cancel handle and signal
pub fn cancel_pair() -> (CancelHandle, CancelSignal) {
    let (tx, rx) = watch::channel(false);
    (CancelHandle(tx), CancelSignal(rx))
}

impl CancelHandle {
    pub fn cancel(&self) {
        // No receivers left means the lookup is already over
        let _ = self.0.send(true);
    }
}

impl CancelSignal {
    pub fn is_cancelled(&self) -> bool {
        *self.0.borrow()
    }

    /// Resolves once cancel is requested. Never resolves if the handle is
    /// dropped without cancelling.
    async fn cancelled(&mut self) {
        loop {
            if *self.0.borrow_and_update() {
                return;
            }
            if self.0.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }
}

/// Fetch the price of `coin`, giving up after `timeout` or on cancel.
///
/// `Ok(None)` means the service answered without a price for the coin.
pub async fn resolve_price(
    source: &dyn MarketDataSource,
    coin: &str,
    timeout: Duration,
    mut cancel: CancelSignal,
) -> CoreResult<Option<f64>> {
    log::debug!("Resolving price of {} (timeout {:?})", coin, timeout);

    tokio::select! {
        biased;
        _ = cancel.cancelled() => {
            log::info!("Price lookup for {} cancelled", coin);
            Err(CoreError::PriceCancelled { coin: coin.to_string() })
        }
        result = tokio::time::timeout(timeout, source.price(coin)) => match result {
            Ok(Ok(price)) => {
                if price.is_none() {
                    log::warn!("Price service returned no price for {}", coin);
                }
                Ok(price)
            }
            Ok(Err(e)) => {
                log::error!("Error fetching the price of {}: {}", coin, e);
                Err(CoreError::PriceLookup { coin: coin.to_string(), source: e })
            }
            Err(_) => {
                log::error!("Price lookup for {} timed out after {:?}", coin, timeout);
                Err(CoreError::PriceTimeout { coin: coin.to_string(), seconds: timeout.as_secs() })
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use async_trait::async_trait;
    use coinbook_market::{Coin, MarketError, MarketResult};
    use std::collections::HashMap;

    enum Behaviour {
        Price(Option<f64>),
        Fail,
        Hang,
    }

    struct Source(Behaviour);

    #[async_trait]
    impl MarketDataSource for Source {
        async fn coin_list(&self) -> MarketResult<Vec<Coin>> {
            Ok(vec![])
        }

        async fn prices(&self, ids: &[String]) -> MarketResult<HashMap<String, Option<f64>>> {
            match self.0 {
                Behaviour::Price(p) => Ok(ids.iter().map(|id| (id.clone(), p)).collect()),
                Behaviour::Fail => Err(MarketError::ServerError(503, "unavailable".to_string())),
                Behaviour::Hang => {
                    tokio::time::sleep(Duration::from_secs(30)).await;
                    Ok(HashMap::new())
                }
            }
        }
    }

    #[tokio::test]
    async fn test_price_found() {
        let (_handle, signal) = cancel_pair();
        let price = resolve_price(&Source(Behaviour::Price(Some(65000.0))), "bitcoin", Duration::from_secs(1), signal)
            .await
            .unwrap();
        assert_eq!(price, Some(65000.0));
    }

    #[tokio::test]
    async fn test_price_absent_is_not_an_error() {
        let (_handle, signal) = cancel_pair();
        let price = resolve_price(&Source(Behaviour::Price(None)), "nocoin", Duration::from_secs(1), signal)
            .await
            .unwrap();
        assert_eq!(price, None);
    }

    #[tokio::test]
    async fn test_service_failure() {
        let (_handle, signal) = cancel_pair();
        let err = resolve_price(&Source(Behaviour::Fail), "bitcoin", Duration::from_secs(1), signal)
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::PriceLookupFailed);
    }

    #[tokio::test]
    async fn test_timeout() {
        let (_handle, signal) = cancel_pair();
        let err = resolve_price(&Source(Behaviour::Hang), "bitcoin", Duration::from_millis(20), signal)
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::PriceLookupTimeout);
    }

    #[tokio::test]
    async fn test_cancel_before_start() {
        let (handle, signal) = cancel_pair();
        handle.cancel();
        assert!(signal.is_cancelled());
        let err = resolve_price(&Source(Behaviour::Hang), "bitcoin", Duration::from_secs(5), signal)
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::PriceLookupCancelled);
    }

    #[tokio::test]
    async fn test_cancel_while_waiting() {
        let (handle, signal) = cancel_pair();
        let lookup = tokio::spawn(async move {
            resolve_price(&Source(Behaviour::Hang), "bitcoin", Duration::from_secs(5), signal).await
        });
        tokio::time::sleep(Duration::from_millis(20)).await;
        handle.cancel();
        let err = lookup.await.unwrap().unwrap_err();
        assert_eq!(err.code(), ErrorCode::PriceLookupCancelled);
    }

    #[tokio::test]
    async fn test_dropped_handle_does_not_cancel() {
        let (handle, signal) = cancel_pair();
        drop(handle);
        let price = resolve_price(&Source(Behaviour::Price(Some(1.0))), "bitcoin", Duration::from_secs(1), signal)
            .await
            .unwrap();
        assert_eq!(price, Some(1.0));
    }
}
