use crate::types::channel::{AlimtalkOptions, ChannelResult};

/// A templated chat channel with a plain SMS path. Implementations report
/// every failure inside [`ChannelResult`].
pub trait TemplateChannel: Send + Sync + 'static {
    type TemplatedFut<'a>: Future<Output = ChannelResult> + Send + 'a
    where
        Self: 'a;
    type PlainFut<'a>: Future<Output = ChannelResult> + Send + 'a
    where
        Self: 'a;

    fn send_templated_message<'a>(
        &'a self,
        to: &'a str,
        template_code: &'a str,
        message: &'a str,
        options: &'a AlimtalkOptions,
    ) -> Self::TemplatedFut<'a>;

    fn send_plain_message<'a>(
        &'a self,
        to: &'a str,
        message: &'a str,
        title: Option<&'a str>,
    ) -> Self::PlainFut<'a>;
}
