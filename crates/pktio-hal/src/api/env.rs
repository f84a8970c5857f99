//! Environment bring-up.

use crate::error::HalResult;
use crate::types::SocketId;

/// Process-wide environment of the layer.
///
/// The environment must be initialized before any pool or device call, and
/// may be initialized at most once at a time.
pub trait EnvApi {
    /// Initializes the environment with a command-line style argument vector.
    ///
    /// `args[0]` is the program name. Returns the number of arguments the
    /// layer consumed.
    fn env_init(&self, args: &[String]) -> HalResult<u32>;

    /// Releases every resource the environment holds.
    fn env_cleanup(&self) -> HalResult<()>;

    /// Socket of the calling thread.
    fn socket_id(&self) -> SocketId;
}
