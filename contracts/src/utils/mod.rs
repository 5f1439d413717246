pub mod ecrecover;
