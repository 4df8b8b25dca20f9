use std::env;
use std::process::ExitCode;
use std::sync::Arc;

use bigdecimal::BigDecimal;
use dotenvy::dotenv;
use order_desk::application::cancellation::CancellationError;
use order_desk::application::session::{report_error, SessionStore};
use order_desk::domain::order::{LineItem, OrderStatus};
use order_desk::domain::ports::Severity;
use order_desk::domain::session::Session;
use order_desk::infrastructure::notifier::{LogNotifier, NotificationSink};
use order_desk::{
    AppConfig, AppError, CartStore, FileStore, HttpOrderApi, OrderService, PermissionChannel,
    WsConnector,
};

const USAGE: &str = "usage: order-desk <command>

commands:
  login <token> [user-id]           store the bearer token
  logout                            forget the stored token
  lock-status <id>                  show which actions an order still allows
  ready <id>                        check whether an order can be paid
  cancel <id>                       cancel an order with its payments, shippings and deliveries
  complete <id>                     mark a fulfilled order completed
  carriers                          list carriers available for delivery
  cart                              show the draft order and its summary
  cart-add <product> <qty> <price>  add a line to the draft order
  cart-clear                        delete the draft order
  checkout                          submit the draft order
  watch                             stream permission updates until interrupted";

#[tokio::main]
async fn main() -> ExitCode {
    dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let args: Vec<String> = env::args().skip(1).collect();
    let Some(command) = args.first() else {
        eprintln!("{}", USAGE);
        return ExitCode::FAILURE;
    };

    let config = match AppConfig::from_env() {
        Ok(c) => c,
        Err(e) => {
            log::error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let notifier = NotificationSink::new();
    notifier.install(Arc::new(LogNotifier));
    let store = Arc::new(FileStore::new(&config.store_dir));
    let sessions = SessionStore::new(store.clone());

    match run(command, &args[1..], &config, store, &sessions, &notifier).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            report_error(&e, &notifier, &sessions);
            ExitCode::FAILURE
        }
    }
}

async fn run(
    command: &str,
    rest: &[String],
    config: &AppConfig,
    store: Arc<FileStore>,
    sessions: &SessionStore<FileStore>,
    notifier: &NotificationSink,
) -> Result<(), AppError> {
    let session = sessions.load();
    let cart = CartStore::new(store);

    match command {
        "login" => {
            sessions.save(&login_session(rest)?)?;
            notifier.notify_default("Logged in.", Severity::Success);
        }
        "logout" => sessions.end()?,
        "lock-status" => {
            let service = service(config, session)?;
            let id = order_id(rest)?;
            let status = service.lock_status().resolve(id).await;
            if let Some(e) = status.error {
                return Err(e.into());
            }
            println!("{:#?}", status.data);
            println!("can edit: {}, can pay: {}", status.data.can_edit(), status.data.can_pay());
            println!("expected status: {}", service.expected_status(id).await?);
        }
        "ready" => {
            let service = service(config, session)?;
            let ready = service.readiness().check(order_id(rest)?).await;
            if let Some(e) = ready.error {
                return Err(e.into());
            }
            println!("ready for payment: {}", ready.data);
        }
        "cancel" => {
            let service = service(config, session)?;
            match service.canceller().cancel(order_id(rest)?).await {
                Ok(progress) => {
                    println!("{:#?}", progress);
                    notifier.notify_default("Order canceled.", Severity::Success);
                }
                Err(CancellationError {
                    stage,
                    progress,
                    source,
                    ..
                }) => {
                    eprintln!("stopped at {:?}; already canceled: {:#?}", stage, progress);
                    return Err(source.into());
                }
            }
        }
        "complete" => {
            let service = service(config, session)?;
            let order = service.complete(order_id(rest)?).await?;
            notifier.notify_default(&format!("Order {} completed.", order.id), Severity::Success);
        }
        "carriers" => {
            for carrier in service(config, session)?.active_carriers().await? {
                let default = if carrier.is_default { " (default)" } else { "" };
                println!("{} {}{}", carrier.prefix, carrier.name, default);
            }
        }
        "cart" => match cart.load() {
            Some(draft) => {
                println!("{:#?}", draft);
                println!("{:#?}", cart.summary().rounded(2));
            }
            None => println!("no draft order"),
        },
        "cart-add" => match cart.save(OrderStatus::Pending, vec![line_item(rest)?])? {
            Some(draft) => println!("draft {} has {} line(s)", draft.id, draft.items.len()),
            None => return Err(AppError::InvalidInput("nothing to add".to_string())),
        },
        "cart-clear" => cart.clear()?,
        "checkout" => {
            let api = api(config, session)?;
            let order = cart.checkout(api.as_ref()).await?;
            notifier.notify_default(&format!("Order {} placed.", order.id), Severity::Success);
        }
        "watch" => {
            let connector = Arc::new(WsConnector::new(&config.ws_base_url));
            let channel = PermissionChannel::new(connector, config.reconnect_policy());
            let handle = channel
                .spawn(&session, |message| println!("{}", message))
                .ok_or(AppError::SessionExpired)?;
            tokio::signal::ctrl_c()
                .await
                .map_err(|e| AppError::Internal(e.to_string()))?;
            handle.shutdown().await;
        }
        other => {
            eprintln!("{}", USAGE);
            return Err(AppError::InvalidInput(format!("unknown command '{}'", other)));
        }
    }
    Ok(())
}

fn api(config: &AppConfig, session: Session) -> Result<Arc<HttpOrderApi>, AppError> {
    let api = HttpOrderApi::new(config.api_base_url()?, session, config.request_timeout)?;
    Ok(Arc::new(api))
}

fn service(config: &AppConfig, session: Session) -> Result<OrderService<HttpOrderApi>, AppError> {
    Ok(OrderService::new(api(config, session)?))
}

fn order_id(rest: &[String]) -> Result<i64, AppError> {
    rest.first()
        .and_then(|raw| raw.parse().ok())
        .ok_or_else(|| AppError::InvalidInput("expected a numeric order id".to_string()))
}

fn login_session(rest: &[String]) -> Result<Session, AppError> {
    let token = rest
        .first()
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| AppError::InvalidInput("login needs a token".to_string()))?;
    let session = Session::new(token.as_str());
    match rest.get(1) {
        None => Ok(session),
        Some(raw) => raw
            .parse()
            .map(|user_id| session.with_user(user_id))
            .map_err(|_| AppError::InvalidInput("user id must be a number".to_string())),
    }
}

fn line_item(rest: &[String]) -> Result<LineItem, AppError> {
    let [product, quantity, price] = rest else {
        return Err(AppError::InvalidInput(
            "cart-add needs a product id, a quantity and a unit price".to_string(),
        ));
    };
    let product = product
        .parse()
        .map_err(|_| AppError::InvalidInput("product id must be a number".to_string()))?;
    let quantity = quantity
        .parse()
        .map_err(|_| AppError::InvalidInput("quantity must be a whole number".to_string()))?;
    let price = price
        .parse::<BigDecimal>()
        .map_err(|_| AppError::InvalidInput(format!("'{}' is not a price", price)))?;
    Ok(LineItem::new(product, quantity, price))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn login_keeps_optional_user_id() {
        let session = login_session(&args(&["t0k", "7"])).unwrap();
        assert_eq!(session.bearer(), Some("t0k"));
        assert_eq!(session.user_id, Some(7));

        assert_eq!(login_session(&args(&["t0k"])).unwrap().user_id, None);
        assert!(login_session(&args(&["t0k", "bruce"])).is_err());
        assert!(login_session(&args(&[" "])).is_err());
    }

    #[test]
    fn parses_cart_line() {
        let line = line_item(&args(&["5", "3", "4.50"])).unwrap();
        assert_eq!(line, LineItem::new(5, 3, "4.50".parse().unwrap()));
    }

    #[test]
    fn rejects_malformed_cart_lines() {
        for raw in [
            &["5", "3"][..],
            &["five", "3", "4.50"],
            &["5", "-1", "4.50"],
            &["5", "3", "cheap"],
            &["5", "3", "4.50", "extra"],
        ] {
            assert!(
                matches!(line_item(&args(raw)), Err(AppError::InvalidInput(_))),
                "{:?} accepted",
                raw
            );
        }
    }
}
