pub mod init;
pub mod login;
pub mod markets;
pub mod new;
pub mod rank;
pub mod repl;
