//! `dispatch_service!` - サービス trait と、その実装（アダプタ）を生成する

/// Declares a queued service.
///
/// ```ignore
/// dispatch_service! {
///     /// Sends user-facing notifications.
///     pub trait Notifier => NotifierService {
///         fn notify(ping: Ping);
///     }
/// }
/// ```
///
/// expands to
/// - `trait Notifier` with `async fn notify(&self, ping: Ping) -> Result<(), DispatchError>`
/// - marker `enum NotifierService` implementing `Service` (`NAME = "Notifier"`)
/// - `impl<T: Invoke<NotifierService>> Notifier for T`, so both `DispatchClient`
///   and `ContextClient` can be called as a `Notifier`.
///
/// Argument types must implement `serde::Serialize`.
#[macro_export]
macro_rules! dispatch_service {
    (
        $(#[$meta:meta])*
        $vis:vis trait $service:ident => $marker:ident {
            $(
                $(#[$method_meta:meta])*
                fn $method:ident($arg:ident : $ty:ty);
            )*
        }
    ) => {
        $(#[$meta])*
        #[allow(async_fn_in_trait)]
        $vis trait $service {
            $(
                $(#[$method_meta])*
                async fn $method(
                    &self,
                    $arg: $ty,
                ) -> ::core::result::Result<(), $crate::domain::DispatchError>;
            )*
        }

        #[doc = concat!("Marker type of the `", stringify!($service), "` service.")]
        $vis enum $marker {}

        impl $crate::typed::Service for $marker {
            const NAME: &'static str = stringify!($service);

            fn methods() -> ::std::vec::Vec<$crate::typed::MethodSignature> {
                ::std::vec![
                    $($crate::typed::MethodSignature::new(stringify!($method)).param::<$ty>(),)*
                ]
            }
        }

        impl<T: $crate::app::Invoke<$marker>> $service for T {
            $(
                async fn $method(
                    &self,
                    $arg: $ty,
                ) -> ::core::result::Result<(), $crate::domain::DispatchError> {
                    <T as $crate::app::Invoke<$marker>>::invoke(self, stringify!($method), &$arg)
                        .await
                }
            )*
        }
    };
}
