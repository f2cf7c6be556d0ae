pub mod payment_gateway;

pub use payment_gateway::{
    ChargeRequest, HttpPaymentGateway, PaymentGateway, RecurringChargeRequest,
};
