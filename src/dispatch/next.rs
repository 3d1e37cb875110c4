use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::context::{Context, Params};
use crate::{Error, Result};

use super::Chain;

/// The continuation a handler fires to run the remainder of its chain.
///
/// The chain is strictly forward-progressing: firing the same continuation
/// a second time is a control-flow violation, not a recoverable error.
pub struct Next {
    chain: Arc<Chain>,
    ctx: Arc<Context>,
    index: usize,
    caller_params: Arc<Params>,
    fired: AtomicBool,
}

impl Next {
    pub(crate) fn new(
        chain: Arc<Chain>,
        ctx: Arc<Context>,
        index: usize,
        caller_params: Arc<Params>,
    ) -> Self {
        Self {
            chain,
            ctx,
            index,
            caller_params,
            fired: AtomicBool::new(false),
        }
    }

    pub async fn run(&self) -> Result<()> {
        if self.fired.swap(true, Ordering::SeqCst) {
            return Err(Error::NextCalledTwice);
        }
        let result = self
            .chain
            .clone()
            .run_from(self.ctx.clone(), self.index)
            .await;
        // Deeper steps rebound the context's params to their own chains;
        // restore the caller's bindings for its post-continuation work.
        self.ctx.bind_params(self.caller_params.clone());
        result
    }
}
