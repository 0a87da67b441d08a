use std::sync::Arc;

use chrono::Utc;

use crate::domain::errors::DomainError;
use crate::domain::notification::{self, Email};
use crate::domain::order::{ListResult, OrderFilter, OrderStatus, OrderView, PlaceOrder, StatusActor};
use crate::domain::order_flow::PlacedOrder;
use crate::domain::ports::{Mailer, OrderRepository};
use crate::domain::user::Identity;

pub struct OrderService<R> {
    repo: R,
    mailer: Arc<dyn Mailer>,
}

impl<R: OrderRepository> OrderService<R> {
    pub fn new(repo: R, mailer: Arc<dyn Mailer>) -> Self {
        Self { repo, mailer }
    }

    /// Mail is best effort: a failure is logged and the caller still succeeds.
    fn notify(&self, email: Email) {
        if let Err(e) = self.mailer.send(&email) {
            log::error!("Failed to send '{}' to {}: {e}", email.subject, email.to);
        }
    }

    pub fn place_order(&self, order: PlaceOrder) -> Result<PlacedOrder, DomainError> {
        let placed = self.repo.place(order, Utc::now())?;
        log::info!(
            "Order {} placed by {} for {}",
            placed.order_id,
            placed.customer.user_id,
            placed.price.total
        );
        self.notify(notification::order_confirmation(&placed));
        Ok(placed)
    }

    fn transition(
        &self,
        order_id: &str,
        next: OrderStatus,
        actor: StatusActor,
    ) -> Result<OrderView, DomainError> {
        let change = self.repo.change_status(order_id, next, actor)?;
        log::info!("Order {} moved {} -> {}", change.order_id, change.from, change.to);
        if let Some(email) = notification::status_update(&change) {
            self.notify(email);
        }
        self.repo
            .find_by_id(order_id)?
            .ok_or_else(|| DomainError::not_found(format!("Order {order_id}")))
    }

    pub fn cancel(&self, caller: Identity, order_id: &str) -> Result<OrderView, DomainError> {
        self.transition(order_id, OrderStatus::Cancelled, StatusActor::Owner(caller.user_id))
    }

    pub fn confirm_delivery(&self, caller: Identity, order_id: &str) -> Result<OrderView, DomainError> {
        self.transition(order_id, OrderStatus::Completed, StatusActor::Owner(caller.user_id))
    }

    pub fn update_status(&self, order_id: &str, next: OrderStatus) -> Result<OrderView, DomainError> {
        self.transition(order_id, next, StatusActor::Admin)
    }

    pub fn get(&self, caller: Identity, order_id: &str) -> Result<OrderView, DomainError> {
        let order = self
            .repo
            .find_by_id(order_id)?
            .ok_or_else(|| DomainError::not_found(format!("Order {order_id}")))?;
        if order.user_id != caller.user_id && !caller.is_admin() {
            return Err(DomainError::forbidden("this order belongs to another customer"));
        }
        Ok(order)
    }

    pub fn list_mine(&self, caller: Identity, filter: &OrderFilter) -> Result<ListResult, DomainError> {
        self.repo.list_for_user(caller.user_id, filter)
    }

    pub fn list_all(&self, filter: &OrderFilter) -> Result<ListResult, DomainError> {
        self.repo.list_all(filter)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use bigdecimal::BigDecimal;
    use chrono::DateTime;
    use uuid::Uuid;

    use super::*;
    use crate::domain::order::OrderLineInput;
    use crate::domain::order_flow::{self, StatusChange};
    use crate::domain::order_flow::memory::MemoryStore;
    use crate::domain::user::Role;

    /// Runs the real workflow over a [`MemoryStore`].
    struct MemoryRepo {
        store: Mutex<MemoryStore>,
    }

    impl MemoryRepo {
        fn view(&self, order_id: &str) -> Option<OrderView> {
            let store = self.store.lock().unwrap();
            let (record, lines) = store
                .tables
                .orders
                .iter()
                .find(|(o, _)| o.order_id == order_id)?;
            Some(OrderView {
                order_id: record.order_id.clone(),
                user_id: record.user_id,
                customer_name: None,
                total_amount: record.total_amount.clone(),
                status: store.status(order_id)?,
                shipping_address: record.shipping_address.clone(),
                payment_method_id: Some(record.payment_method_id.clone()),
                payment_method_name: None,
                created_at: record.created_at,
                lines: lines
                    .iter()
                    .map(|l| crate::domain::order::OrderLineView {
                        detail_id: 0,
                        book_id: l.book_id.clone(),
                        title: None,
                        cover_image_url: None,
                        quantity: l.quantity,
                        unit_price: l.unit_price.clone(),
                    })
                    .collect(),
            })
        }
    }

    impl OrderRepository for MemoryRepo {
        fn place(&self, order: PlaceOrder, now: DateTime<Utc>) -> Result<PlacedOrder, DomainError> {
            let mut store = self.store.lock().unwrap();
            store.atomically(|s| order_flow::place(s, order, now))
        }

        fn change_status(
            &self,
            order_id: &str,
            next: OrderStatus,
            actor: StatusActor,
        ) -> Result<StatusChange, DomainError> {
            let mut store = self.store.lock().unwrap();
            store.atomically(|s| order_flow::change_status(s, order_id, next, actor))
        }

        fn find_by_id(&self, order_id: &str) -> Result<Option<OrderView>, DomainError> {
            Ok(self.view(order_id))
        }

        fn list_for_user(&self, _: Uuid, _: &OrderFilter) -> Result<ListResult, DomainError> {
            unimplemented!()
        }

        fn list_all(&self, _: &OrderFilter) -> Result<ListResult, DomainError> {
            unimplemented!()
        }
    }

    #[derive(Default)]
    struct RecordingMailer {
        sent: Mutex<Vec<Email>>,
        fail: bool,
    }

    impl Mailer for RecordingMailer {
        fn send(&self, email: &Email) -> Result<(), DomainError> {
            self.sent.lock().unwrap().push(email.clone());
            if self.fail {
                Err(DomainError::Internal("smtp down".to_string()))
            } else {
                Ok(())
            }
        }
    }

    struct Fixture {
        service: OrderService<MemoryRepo>,
        mailer: Arc<RecordingMailer>,
        customer: Identity,
    }

    fn fixture(fail_mail: bool) -> Fixture {
        let mut store = MemoryStore::default();
        let user_id = store.add_customer("Lan");
        store.tables.payment_methods.push("COD".to_string());
        store.add_book("B001", 100_000, 10);
        let mailer = Arc::new(RecordingMailer {
            fail: fail_mail,
            ..Default::default()
        });
        let service = OrderService::new(
            MemoryRepo {
                store: Mutex::new(store),
            },
            mailer.clone(),
        );
        Fixture {
            service,
            mailer,
            customer: Identity {
                user_id,
                role: Role::Customer,
            },
        }
    }

    fn order(user_id: Uuid, quantity: i32) -> PlaceOrder {
        PlaceOrder {
            user_id,
            shipping_address: "1 Lê Lợi, Huế".to_string(),
            payment_method_id: "COD".to_string(),
            voucher_code: None,
            lines: vec![OrderLineInput {
                book_id: "B001".to_string(),
                quantity,
            }],
        }
    }

    #[test]
    fn placing_sends_a_confirmation() {
        let f = fixture(false);
        let placed = f.service.place_order(order(f.customer.user_id, 2)).unwrap();

        assert_eq!(placed.price.total, BigDecimal::from(230_000));
        let sent = f.mailer.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "lan@example.com");
    }

    /// Keeps info-level messages so tests can count them.
    struct CapturedLogs(Mutex<Vec<String>>);

    impl log::Log for CapturedLogs {
        fn enabled(&self, metadata: &log::Metadata) -> bool {
            metadata.level() <= log::Level::Info
        }

        fn log(&self, record: &log::Record) {
            if self.enabled(record.metadata()) {
                self.0.lock().unwrap().push(record.args().to_string());
            }
        }

        fn flush(&self) {}
    }

    static LOGS: CapturedLogs = CapturedLogs(Mutex::new(Vec::new()));

    fn captured_logs() -> &'static CapturedLogs {
        static INSTALL: std::sync::Once = std::sync::Once::new();
        INSTALL.call_once(|| {
            log::set_logger(&LOGS).unwrap();
            log::set_max_level(log::LevelFilter::Info);
        });
        &LOGS
    }

    #[test]
    fn placement_is_logged_once() {
        let logs = captured_logs();
        let f = fixture(false);
        f.service.place_order(order(f.customer.user_id, 1)).unwrap();

        let marker = format!("placed by {}", f.customer.user_id);
        let lines = logs.0.lock().unwrap();
        assert_eq!(lines.iter().filter(|l| l.contains(&marker)).count(), 1);
    }

    #[test]
    fn mail_failure_does_not_fail_the_order() {
        let f = fixture(true);
        let placed = f.service.place_order(order(f.customer.user_id, 1));

        assert!(placed.is_ok());
        assert_eq!(f.mailer.sent.lock().unwrap().len(), 1);
    }

    #[test]
    fn rejected_order_sends_nothing() {
        let f = fixture(false);
        let err = f.service.place_order(order(f.customer.user_id, 11)).unwrap_err();

        assert!(matches!(err, DomainError::InsufficientStock { .. }));
        assert!(f.mailer.sent.lock().unwrap().is_empty());
    }

    #[test]
    fn cancel_returns_the_updated_order_and_mails() {
        let f = fixture(false);
        let placed = f.service.place_order(order(f.customer.user_id, 1)).unwrap();

        let view = f.service.cancel(f.customer, &placed.order_id).unwrap();

        assert_eq!(view.status, OrderStatus::Cancelled);
        assert_eq!(f.mailer.sent.lock().unwrap().len(), 2);
    }

    #[test]
    fn get_is_limited_to_owner_or_admin() {
        let f = fixture(false);
        let placed = f.service.place_order(order(f.customer.user_id, 1)).unwrap();
        let stranger = Identity {
            user_id: Uuid::new_v4(),
            role: Role::Customer,
        };
        let admin = Identity {
            user_id: Uuid::new_v4(),
            role: Role::Admin,
        };

        assert!(f.service.get(f.customer, &placed.order_id).is_ok());
        assert!(f.service.get(admin, &placed.order_id).is_ok());
        assert!(matches!(
            f.service.get(stranger, &placed.order_id).unwrap_err(),
            DomainError::Forbidden(_)
        ));
        assert!(matches!(
            f.service.get(admin, "ORD99999").unwrap_err(),
            DomainError::NotFound(_)
        ));
    }

    #[test]
    fn full_lifecycle_through_the_service() {
        let f = fixture(false);
        let placed = f.service.place_order(order(f.customer.user_id, 1)).unwrap();
        let id = placed.order_id.as_str();

        f.service.update_status(id, OrderStatus::Confirmed).unwrap();
        f.service.update_status(id, OrderStatus::Shipping).unwrap();
        assert!(matches!(
            f.service.update_status(id, OrderStatus::Completed).unwrap_err(),
            DomainError::Forbidden(_)
        ));
        let done = f.service.confirm_delivery(f.customer, id).unwrap();

        assert_eq!(done.status, OrderStatus::Completed);
    }
}
