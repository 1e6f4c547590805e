//! Credit-card billing cycles.
//!
//! Maps purchase dates onto invoice months and derives closing/due dates and
//! the open/closed/paid status of a bill.

pub mod cycle;

pub use cycle::{
    bill_status, closing_date, due_date, invoice_month_for, BillStatus, InvoiceMonth,
    ParseInvoiceMonthError,
};
