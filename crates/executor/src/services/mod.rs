pub mod execution_service;
pub mod pnl_report;
pub mod position_sizer;
pub mod session;
pub mod telegram_service;
