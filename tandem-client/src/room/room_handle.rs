use crate::room::room_command::RoomCommand;
use tokio::sync::mpsc;

/// Cloneable handle for controlling a running room session from outside the
/// event loop.
#[derive(Clone)]
pub struct RoomHandle {
    pub(crate) commands: mpsc::Sender<RoomCommand>,
}

impl RoomHandle {
    /// Ask the session loop to terminate. Idempotent: once the loop has
    /// exited the command is simply dropped.
    pub async fn leave(&self) {
        let _ = self.commands.send(RoomCommand::Leave).await;
    }
}
