use crate::types::push::PushSubscription;

pub trait SubscriptionStore: Send + Sync + 'static {
    type Error: std::fmt::Display + Send + Sync + 'static;
    type ListFut<'a>: Future<Output = Result<Vec<PushSubscription>, Self::Error>> + Send + 'a
    where
        Self: 'a;
    type RemoveFut<'a>: Future<Output = Result<(), Self::Error>> + Send + 'a
    where
        Self: 'a;

    fn subscriptions<'a>(&'a self, user_id: &'a str) -> Self::ListFut<'a>;

    /// Drops a subscription the push service reported as gone.
    fn remove<'a>(&'a self, user_id: &'a str, endpoint: &'a str) -> Self::RemoveFut<'a>;
}

pub trait UserDirectory: Send + Sync + 'static {
    type Error: std::fmt::Display + Send + Sync + 'static;
    type PhoneFut<'a>: Future<Output = Result<Option<String>, Self::Error>> + Send + 'a
    where
        Self: 'a;

    fn phone_number<'a>(&'a self, user_id: &'a str) -> Self::PhoneFut<'a>;
}
