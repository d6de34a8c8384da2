//! Platform window-manager query.
//!
//! The tracker's only external read dependency: ask the platform which
//! window currently has focus and get back an identifying string. On
//! Linux this walks X11 properties; elsewhere a stub reports nothing and
//! the context stays at its previous value.

use anyhow::Result;

/// A source for the current foreground-window identifier.
///
/// `active_window` returns `None` on any failure (no connection, transient
/// protocol error, empty result) - failures are expected and never
/// propagate past the tracker.
pub trait WindowQuery {
    fn active_window(&self) -> Option<String>;
}

/// Fixed-answer query used by tests and unsupported platforms.
#[derive(Debug, Clone, Default)]
pub struct StubWindowQuery {
    identifier: Option<String>,
}

impl StubWindowQuery {
    pub fn new(identifier: Option<String>) -> Self {
        Self { identifier }
    }
}

impl WindowQuery for StubWindowQuery {
    fn active_window(&self) -> Option<String> {
        self.identifier.clone()
    }
}

#[cfg(target_os = "linux")]
pub use x11::X11WindowQuery;

#[cfg(target_os = "linux")]
mod x11 {
    use super::WindowQuery;
    use anyhow::{Context, Result};
    use x11rb::connection::Connection;
    use x11rb::protocol::xproto::{AtomEnum, ConnectionExt, Window};

    /// Reads the focused window's title (or class as a fallback) from the
    /// X server via `_NET_ACTIVE_WINDOW`.
    pub struct X11WindowQuery {
        conn: x11rb::rust_connection::RustConnection,
        root: Window,
    }

    impl X11WindowQuery {
        pub fn new() -> Result<Self> {
            let (conn, screen_num) =
                x11rb::connect(None).context("Failed to connect to X server")?;
            let root = conn.setup().roots[screen_num].root;
            Ok(Self { conn, root })
        }

        fn get_atom(&self, name: &str) -> Option<u32> {
            self.conn
                .intern_atom(false, name.as_bytes())
                .ok()?
                .reply()
                .ok()
                .map(|r| r.atom)
        }

        fn get_window_property(&self, window: Window, atom: u32) -> Option<String> {
            let reply = self
                .conn
                .get_property(false, window, atom, AtomEnum::ANY, 0, 1024)
                .ok()?
                .reply()
                .ok()?;

            if reply.value.is_empty() {
                return None;
            }

            String::from_utf8(reply.value).ok()
        }

        fn get_active_window_id(&self) -> Option<Window> {
            let atom = self.get_atom("_NET_ACTIVE_WINDOW")?;
            let reply = self
                .conn
                .get_property(false, self.root, atom, AtomEnum::WINDOW, 0, 1)
                .ok()?
                .reply()
                .ok()?;

            if reply.value.len() >= 4 {
                Some(u32::from_ne_bytes([
                    reply.value[0],
                    reply.value[1],
                    reply.value[2],
                    reply.value[3],
                ]))
            } else {
                None
            }
        }
    }

    impl WindowQuery for X11WindowQuery {
        fn active_window(&self) -> Option<String> {
            let window_id = self.get_active_window_id()?;

            let name_atom = self
                .get_atom("_NET_WM_NAME")
                .or_else(|| Some(AtomEnum::WM_NAME.into()))?;

            if let Some(title) = self.get_window_property(window_id, name_atom) {
                if !title.is_empty() {
                    return Some(title);
                }
            }

            // WM_CLASS is "instance\0class\0"; the instance name is enough
            self.get_window_property(window_id, AtomEnum::WM_CLASS.into())
                .and_then(|s| s.split('\0').next().map(str::to_string))
                .filter(|s| !s.is_empty())
        }
    }

}

/// Construct the platform-native query.
///
/// On unsupported platforms this is a stub that always reports no window;
/// the tracker then simply retains `"Unknown"`.
pub fn native_query() -> Result<Box<dyn WindowQuery + Send>> {
    #[cfg(target_os = "linux")]
    {
        Ok(Box::new(X11WindowQuery::new()?))
    }
    #[cfg(not(target_os = "linux"))]
    {
        Ok(Box::new(StubWindowQuery::default()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stub_reports_its_fixed_answer() {
        let query = StubWindowQuery::new(Some("Firefox".to_string()));
        assert_eq!(query.active_window(), Some("Firefox".to_string()));
        assert_eq!(StubWindowQuery::default().active_window(), None);
    }
}
