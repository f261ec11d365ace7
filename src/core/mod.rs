pub(crate) mod command_buffer_builder_ext;
pub mod init;
