//! High-level driver for device interaction.
//!
//! [`Session`] is the MikroTik driver. The [`Driver`] trait is the capability
//! surface it shares with drivers for devices that really have pagers, config
//! modes and startup configs.

mod builder;
mod echo;
mod generic;
mod options;
mod privilege;
mod prompt;
mod response;
mod session;
mod state;

pub use builder::DriverBuilder;
pub use echo::RepaintEcho;
pub use generic::{CommandEcho, GenericHandler, RESPONSE_RETURN};
pub use options::{SendOptions, SessionOptions, TimingOptions};
pub use privilege::{NoEnable, PrivilegeMode};
pub use prompt::{extract_prompt, strip_prompt};
pub use response::Response;
pub use session::Session;
pub use state::SessionState;

use std::future::Future;

use crate::error::Result;

/// Operations every device driver offers, whether or not the device
/// implements them natively.
pub trait Driver: Send {
    /// Detect the prompt and settle the session after the stream opens.
    fn prepare_session(&mut self) -> impl Future<Output = Result<()>> + Send;

    /// Elicit the prompt and store it as the base prompt.
    fn set_base_prompt(&mut self) -> impl Future<Output = Result<String>> + Send;

    /// Send a command and wait for the prompt.
    fn send_command(&mut self, command: &str) -> impl Future<Output = Result<Response>> + Send;

    /// Send a command and read until the device goes quiet.
    fn send_command_timing(
        &mut self,
        command: &str,
        options: TimingOptions,
    ) -> impl Future<Output = Result<Response>> + Send;

    /// Send multiple commands sequentially.
    fn send_commands(
        &mut self,
        commands: &[&str],
    ) -> impl Future<Output = Result<Vec<Response>>> + Send {
        async move {
            let mut responses = Vec::with_capacity(commands.len());
            for cmd in commands {
                responses.push(self.send_command(cmd).await?);
            }
            Ok(responses)
        }
    }

    /// Enter config mode, send each line, and leave config mode.
    fn send_config_set(
        &mut self,
        commands: &[&str],
    ) -> impl Future<Output = Result<Vec<Response>>> + Send {
        async move {
            self.config_mode().await?;
            let mut responses = Vec::with_capacity(commands.len());
            for cmd in commands {
                responses.push(
                    self.send_command_timing(cmd, TimingOptions::default())
                        .await?,
                );
            }
            self.exit_config_mode().await?;
            Ok(responses)
        }
    }

    /// Discard pending output.
    fn clear_buffer(&mut self) -> impl Future<Output = Result<String>> + Send;

    /// Turn off the pager.
    fn disable_paging(&mut self) -> impl Future<Output = Result<String>> + Send;

    /// Persist the running configuration.
    fn save_config(&mut self) -> impl Future<Output = Result<String>> + Send;

    /// Enter configuration mode.
    fn config_mode(&mut self) -> impl Future<Output = Result<String>> + Send;

    /// Leave configuration mode.
    fn exit_config_mode(&mut self) -> impl Future<Output = Result<String>> + Send;

    /// Whether the session is in configuration mode.
    fn check_config_mode(&self) -> bool;

    /// Escalate to the privileged mode.
    fn enable(&mut self) -> impl Future<Output = Result<String>> + Send;

    /// Leave the privileged mode.
    fn exit_enable_mode(&mut self) -> impl Future<Output = Result<String>> + Send;

    /// Whether the session is privileged.
    fn check_enable_mode(&self) -> bool;

    /// Remove trailing prompt lines from `text`.
    fn strip_prompt(&self, text: &str) -> String;

    /// Close the session.
    fn close(&mut self) -> impl Future<Output = Result<()>> + Send;

    /// Check if the session can still send commands.
    fn is_open(&self) -> bool;
}
