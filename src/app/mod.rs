pub mod dispatch;
pub mod simulate;
