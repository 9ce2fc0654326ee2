//! Context/surface lifecycle entry points.
//!
//! Lifecycle calls are always synchronous: the real driver decides whether
//! the operation succeeds, and the issuing-side registry is only updated
//! after it reports success. They also bypass the active-context check,
//! since by definition they may run with no context bound.

use crate::client::GlesClient;
use glink_protocol::{Command, ContextId, DisplayId, Reply, SurfaceId};
use tracing::debug;

impl GlesClient {
    /// Bind `(display, context)` with the given surfaces, or unbind the
    /// current context when `context` is [`ContextId::NONE`].
    pub fn make_current(
        &mut self,
        display: DisplayId,
        draw: SurfaceId,
        read: SurfaceId,
        context: ContextId,
    ) -> bool {
        let ok = self.call_bool(Command::MakeCurrent {
            display,
            draw,
            read,
            context,
        });
        if ok {
            self.registry.make_current(display, draw, read, context);
            let (dpy, ctx) = (display, context);
            debug!(display = ?dpy, context = ?ctx, "made current");
        }
        ok
    }

    pub fn destroy_context(&mut self, display: DisplayId, context: ContextId) -> bool {
        let ok = self.call_bool(Command::DestroyContext { display, context });
        if ok {
            self.registry.destroy_context(display, context);
        }
        ok
    }

    pub fn destroy_surface(&mut self, display: DisplayId, surface: SurfaceId) -> bool {
        let ok = self.call_bool(Command::DestroySurface { display, surface });
        if ok {
            self.registry.destroy_surface(display, surface);
        }
        ok
    }

    pub fn terminate(&mut self, display: DisplayId) -> bool {
        let ok = self.call_bool(Command::Terminate { display });
        if ok {
            self.registry.terminate(display);
        }
        ok
    }

    /// Unbind whatever this thread has current.
    pub fn release_thread(&mut self) -> bool {
        let ok = self.call_bool(Command::ReleaseThread);
        if ok {
            self.registry.release();
        }
        ok
    }

    /// Tell the consumer this producer is going away. Consumes the client;
    /// the record is asynchronous and nothing waits on it.
    pub fn disconnect(mut self) {
        let cmd = Command::Disconnect;
        self.producer.post(cmd.opcode(), &cmd.encode_payload());
    }

    fn call_bool(&mut self, cmd: Command) -> bool {
        matches!(self.call_reply(&cmd), Some(Reply::Bool(true)))
    }
}
