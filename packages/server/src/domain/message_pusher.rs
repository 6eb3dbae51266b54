//! MessagePusher trait 定義
//!
//! 購読者へのメッセージ配信のインターフェース。
//! 具体的な実装（WebSocket など）は Infrastructure 層が提供します。

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::{MessagePushError, SubscriberId};

/// 購読者へのメッセージ送信チャンネル
pub type PusherChannel = mpsc::UnboundedSender<String>;

/// MessagePusher trait
///
/// 配信は fire-and-forget です。再送やバッファリングは行いません。
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MessagePusher: Send + Sync {
    /// 購読者の送信チャンネルを登録
    async fn register_client(&self, subscriber: SubscriberId, sender: PusherChannel);

    /// 購読者の送信チャンネルを登録解除
    async fn unregister_client(&self, subscriber: &SubscriberId);

    /// 特定の購読者にメッセージを送信
    async fn push_to(&self, subscriber: &SubscriberId, content: &str)
    -> Result<(), MessagePushError>;

    /// 複数の購読者にメッセージを送信
    ///
    /// 一部の送信失敗は許容し、実際に配信できた購読者の数を返す。
    async fn broadcast(&self, targets: Vec<SubscriberId>, content: &str) -> usize;
}
