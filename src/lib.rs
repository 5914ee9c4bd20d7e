pub mod megumi;
