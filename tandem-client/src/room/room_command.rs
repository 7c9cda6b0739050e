/// Commands flowing into the session loop from the owning application.
#[derive(Debug)]
pub enum RoomCommand {
    /// Terminate the local session: destroy every peer session, release the
    /// capture handle and close the relay connection.
    Leave,
}
