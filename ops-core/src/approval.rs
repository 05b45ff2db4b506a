//! The confirmation gate between the remediator and a human operator.
//!
//! The remediator sends an [`ApprovalRequest`] and awaits the oneshot
//! reply. There is no timeout: the wait blocks until the operator
//! answers or the channel is dropped.

use crate::error::OpsError;
use tokio::sync::{mpsc, oneshot};

#[derive(Debug)]
pub struct ApprovalRequest {
    pub incident_id: String,
    pub action: String,
    pub reply: oneshot::Sender<bool>,
}

pub type ApprovalSender = mpsc::Sender<ApprovalRequest>;
pub type ApprovalReceiver = mpsc::Receiver<ApprovalRequest>;

pub fn approval_channel(buffer: usize) -> (ApprovalSender, ApprovalReceiver) {
    mpsc::channel(buffer)
}

pub async fn request_approval(
    tx: &ApprovalSender,
    incident_id: &str,
    action: &str,
) -> Result<bool, OpsError> {
    let (reply_tx, reply_rx) = oneshot::channel();
    tx.send(ApprovalRequest {
        incident_id: incident_id.to_string(),
        action: action.to_string(),
        reply: reply_tx,
    })
    .await
    .map_err(|_| OpsError::ApprovalChannelClosed)?;

    reply_rx.await.map_err(|_| OpsError::ApprovalChannelClosed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn delivers_the_operator_decision() {
        let (tx, mut rx) = approval_channel(1);
        let answer = tokio::spawn(async move {
            let req = rx.recv().await.expect("request");
            assert_eq!(req.incident_id, "inc-1");
            assert_eq!(req.action, "restart mobile-gateway");
            req.reply.send(true).expect("reply");
        });

        let confirmed = request_approval(&tx, "inc-1", "restart mobile-gateway")
            .await
            .expect("approval");
        assert!(confirmed);
        answer.await.expect("answer task");
    }

    #[tokio::test]
    async fn closed_channel_is_an_error() {
        let (tx, rx) = approval_channel(1);
        drop(rx);
        let err = request_approval(&tx, "inc-1", "restart mobile-gateway")
            .await
            .expect_err("closed channel");
        assert!(matches!(err, OpsError::ApprovalChannelClosed));
    }

    #[tokio::test]
    async fn dropped_reply_is_an_error() {
        let (tx, mut rx) = approval_channel(1);
        tokio::spawn(async move {
            let req = rx.recv().await.expect("request");
            drop(req.reply);
        });

        let err = request_approval(&tx, "inc-1", "restart mobile-gateway")
            .await
            .expect_err("dropped reply");
        assert!(matches!(err, OpsError::ApprovalChannelClosed));
    }
}
