//! Shorthand for building future effects
//!
//! Reducers in the booking client mostly return one of two shapes: an async
//! backend call whose result is fed back as an action, or a fire-and-forget side
//! effect such as persisting to storage or raising a notice.

/// Wrap an async block whose value is the follow-up action
///
/// # Example
///
/// ```rust,ignore
/// use busline_core::async_effect;
///
/// async_effect! {
///     let result = catalog.schedules(query).await;
///     Some(BookingAction::SearchCompleted { generation, result })
/// }
/// ```
#[macro_export]
macro_rules! async_effect {
    ($($body:tt)*) => {
        $crate::effect::Effect::Future(
            ::std::boxed::Box::pin(async move { $($body)* })
        )
    };
}

/// Wrap an async block run only for its side effect
///
/// # Example
///
/// ```rust,ignore
/// use busline_core::fire_and_forget;
///
/// fire_and_forget! {
///     notifier.notify(Notice::error("Search Error", "Please select both origin and destination"));
/// }
/// ```
#[macro_export]
macro_rules! fire_and_forget {
    ($($body:tt)*) => {
        $crate::effect::Effect::Future(
            ::std::boxed::Box::pin(async move {
                $($body)*
                None
            })
        )
    };
}
