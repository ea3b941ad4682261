/// Application State: the surface and the GPU context bound to it.
///
/// Exists only after both were created. `context` is declared first so an
/// implicit drop also releases it before `surface`.
pub struct AppState<S, C> {
    context: C,
    surface: S,
}

impl<S, C> AppState<S, C> {
    pub fn new(surface: S, context: C) -> Self {
        Self { context, surface }
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn context_mut(&mut self) -> &mut C {
        &mut self.context
    }

    /// Borrows both handles, e.g. for a present call.
    pub fn split_mut(&mut self) -> (&S, &mut C) {
        (&self.surface, &mut self.context)
    }

    /// Hands back `(context, surface)` in release order.
    pub fn into_parts(self) -> (C, S) {
        (self.context, self.surface)
    }
}
