//! Conditions: the unit of message routing inside a topic.
//!
//! A condition pairs a predicate with a handler. The predicate looks at
//! the inbound message and either declines (`Ok(None)`) or produces a
//! parse result; the handler receives that result. The parse result type
//! is chosen per condition and erased together with the handler, so it
//! never has to be serializable or shared between conditions.

use crate::reply::Reply;
use crate::state::TopicState;
use futures::future::{self, BoxFuture, FutureExt, Ready};
use regex::Regex;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use yak_core::{InboundMessage, TopicError};

/// A matched condition's handler, ready to run against a state.
pub(crate) type Invocation =
    Box<dyn FnOnce(TopicState) -> BoxFuture<'static, Result<Reply, TopicError>> + Send>;

type EvaluateFn = dyn Fn(TopicState, InboundMessage) -> BoxFuture<'static, Result<Option<Invocation>, TopicError>>
    + Send
    + Sync;

/// A named predicate + handler pair.
///
/// Order inside a topic matters: the dispatcher runs the first condition
/// whose predicate matches and ignores the rest.
#[derive(Clone)]
pub struct Condition {
    name: String,
    evaluate: Arc<EvaluateFn>,
}

impl Condition {
    /// Build a condition from a predicate and a handler.
    ///
    /// Returning `Ok(None)` from the predicate means "no match". An `Err`
    /// is not treated as a non-match: it aborts the turn and reaches the
    /// host. A predicate that wants errors to mean "no match" must map
    /// them to `Ok(None)` itself.
    ///
    /// # Example
    ///
    /// ```
    /// use yak_engine::{Condition, Reply};
    ///
    /// let boom = Condition::new(
    ///     "boomshanker",
    ///     |_state, input: yak_core::InboundMessage| async move {
    ///         Ok((input.as_text() == Some("Boomshanker")).then(|| "zomg!".to_string()))
    ///     },
    ///     |_state, zomg: String| async move { Ok(Reply::from(format!("omg {zomg}"))) },
    /// );
    /// assert_eq!(boom.name(), "boomshanker");
    /// ```
    pub fn new<T, P, PFut, H, HFut>(name: impl Into<String>, predicate: P, handler: H) -> Self
    where
        T: Send + 'static,
        P: Fn(TopicState, InboundMessage) -> PFut + Send + Sync + 'static,
        PFut: Future<Output = Result<Option<T>, TopicError>> + Send + 'static,
        H: Fn(TopicState, T) -> HFut + Send + Sync + 'static,
        HFut: Future<Output = Result<Reply, TopicError>> + Send + 'static,
    {
        let handler = Arc::new(handler);
        let evaluate = move |state: TopicState,
                             input: InboundMessage|
              -> BoxFuture<'static, Result<Option<Invocation>, TopicError>> {
            let parsed = predicate(state, input);
            let handler = Arc::clone(&handler);
            async move {
                let invocation = parsed.await?.map(|result| -> Invocation {
                    Box::new(move |state: TopicState| handler(state, result).boxed())
                });
                Ok(invocation)
            }
            .boxed()
        };

        Self {
            name: name.into(),
            evaluate: Arc::new(evaluate),
        }
    }

    /// Build a condition that matches the message text against `patterns`
    /// in order. The handler receives the first successful [`RegexMatch`].
    ///
    /// Fails with [`TopicError::InvalidPattern`] if a pattern does not
    /// compile.
    pub fn regex<H, HFut>(name: impl Into<String>, patterns: &[&str], handler: H) -> Result<Self, TopicError>
    where
        H: Fn(TopicState, RegexMatch) -> HFut + Send + Sync + 'static,
        HFut: Future<Output = Result<Reply, TopicError>> + Send + 'static,
    {
        let compiled = compile_patterns(patterns)?;
        let predicate = regex_predicate(compiled, |input: &InboundMessage| {
            input.as_text().map(str::to_owned)
        });
        Ok(Self::new(name, predicate, handler))
    }

    /// The condition's name, as used by allow- and deny-lists.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Run the predicate. On a match, returns the handler bound to the
    /// parse result; the caller decides when to run it.
    pub(crate) fn evaluate(
        &self,
        state: TopicState,
        input: InboundMessage,
    ) -> BoxFuture<'static, Result<Option<Invocation>, TopicError>> {
        (self.evaluate)(state, input)
    }
}

impl fmt::Debug for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Condition").field("name", &self.name).finish()
    }
}

/// The parse result of a regex predicate.
#[derive(Debug, Clone, PartialEq)]
pub struct RegexMatch {
    /// The message that matched.
    pub input: InboundMessage,
    /// Index of the pattern that matched.
    pub index: usize,
    /// Capture groups; 0 is the whole match. Groups that did not
    /// participate in the match are `None`.
    pub captures: Vec<Option<String>>,
}

impl RegexMatch {
    /// Text of capture group `i`, if it participated in the match.
    pub fn group(&self, i: usize) -> Option<&str> {
        self.captures.get(i).and_then(|c| c.as_deref())
    }
}

/// Compile string patterns into regexes.
pub fn compile_patterns(patterns: &[&str]) -> Result<Vec<Regex>, TopicError> {
    patterns
        .iter()
        .map(|p| Regex::new(p).map_err(|e| TopicError::InvalidPattern(e.to_string())))
        .collect()
}

/// A predicate that tries `patterns` in order against the text chosen by
/// `extractor`. The first pattern that matches wins. Messages for which
/// the extractor returns `None` never match.
pub fn regex_predicate<E>(
    patterns: Vec<Regex>,
    extractor: E,
) -> impl Fn(TopicState, InboundMessage) -> Ready<Result<Option<RegexMatch>, TopicError>> + Send + Sync + 'static
where
    E: Fn(&InboundMessage) -> Option<String> + Send + Sync + 'static,
{
    move |_state: TopicState, input: InboundMessage| {
        future::ready(Ok(match_patterns(&patterns, &extractor, input)))
    }
}

fn match_patterns<E>(patterns: &[Regex], extractor: &E, input: InboundMessage) -> Option<RegexMatch>
where
    E: Fn(&InboundMessage) -> Option<String>,
{
    let text = extractor(&input)?;
    patterns.iter().enumerate().find_map(|(index, pattern)| {
        pattern.captures(&text).map(|caps| RegexMatch {
            input: input.clone(),
            index,
            captures: caps
                .iter()
                .map(|m| m.map(|m| m.as_str().to_owned()))
                .collect(),
        })
    })
}
