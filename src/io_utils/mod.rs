pub mod bash;
pub mod temporary_file;
