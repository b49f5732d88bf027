//! Named extension points fired around every pipeline stage.

use std::collections::HashMap;

/// Pipeline stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Load,
    Create,
    Convert,
    Generate,
    Menus,
    Render,
    Copy,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Load => "load",
            Self::Create => "create",
            Self::Convert => "convert",
            Self::Generate => "generate",
            Self::Menus => "menus",
            Self::Render => "render",
            Self::Copy => "copy",
        }
    }

    /// Hook name fired before the stage runs.
    pub fn pre(&self) -> String {
        format!("{}.pre", self.as_str())
    }

    /// Hook name fired after the stage succeeds.
    pub fn post(&self) -> String {
        format!("{}.post", self.as_str())
    }

    /// Hook name fired when the stage fails.
    pub fn exception(&self) -> String {
        format!("{}.exception", self.as_str())
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payload handed to listeners.
#[derive(Debug, Clone, Copy)]
pub struct HookEvent<'a> {
    /// Hook name, e.g. `render.pre`
    pub name: &'a str,

    /// Stage parameters
    pub payload: &'a serde_json::Value,
}

type Listener = Box<dyn Fn(&HookEvent<'_>) + Send + Sync>;

/// Registry of hook listeners. Listeners observe; they cannot alter the build.
#[derive(Default)]
pub struct Hooks {
    named: HashMap<String, Vec<Listener>>,
    any: Vec<Listener>,
}

impl Hooks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Listen to one hook name.
    pub fn on(
        &mut self,
        name: impl Into<String>,
        listener: impl Fn(&HookEvent<'_>) + Send + Sync + 'static,
    ) {
        self.named
            .entry(name.into())
            .or_default()
            .push(Box::new(listener));
    }

    /// Listen to every hook.
    pub fn on_any(&mut self, listener: impl Fn(&HookEvent<'_>) + Send + Sync + 'static) {
        self.any.push(Box::new(listener));
    }

    /// Call the listeners of `name` in registration order, then the catch-all ones.
    pub fn fire(&self, name: &str, payload: &serde_json::Value) {
        let event = HookEvent { name, payload };
        for listener in self.named.get(name).into_iter().flatten() {
            listener(&event);
        }
        for listener in &self.any {
            listener(&event);
        }
    }
}

impl std::fmt::Debug for Hooks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Hooks")
            .field("named", &self.named.keys().collect::<Vec<_>>())
            .field("any", &self.any.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::{Arc, Mutex};

    #[test]
    fn fires_named_and_catch_all_listeners() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut hooks = Hooks::new();

        let named = Arc::clone(&seen);
        hooks.on("render.pre", move |event| {
            named.lock().unwrap().push(format!("named:{}", event.name));
        });
        let any = Arc::clone(&seen);
        hooks.on_any(move |event| {
            any.lock().unwrap().push(format!("any:{}", event.name));
        });

        hooks.fire("render.pre", &json!({}));
        hooks.fire("render.post", &json!({}));

        assert_eq!(
            *seen.lock().unwrap(),
            vec!["named:render.pre", "any:render.pre", "any:render.post"]
        );
    }

    #[test]
    fn names_stage_hooks() {
        assert_eq!(Stage::Generate.pre(), "generate.pre");
        assert_eq!(Stage::Copy.post(), "copy.post");
        assert_eq!(Stage::Convert.exception(), "convert.exception");
    }
}
