//! Multi-step ticket workflows.
//!
//! These chain single operations of [`RtirClient`] the way an analyst works
//! a ticket: claim it, answer or comment, classify, close. Intermediate
//! steps are best-effort. A failing step is logged and the chain goes on;
//! nothing is rolled back. The result of the final step is returned.

use crate::error::RtirError;
use crate::models::{NewTicket, OwnershipAction, INCIDENTS_QUEUE};
use crate::rt_client::RtirClient;

impl RtirClient {
    /// Takes the ticket if it is unowned, steals it if someone else owns
    /// it, and does nothing if the logged-in user already owns it.
    pub async fn take_or_steal_ticket(&mut self, ticket_id: &str) -> Result<OwnershipAction, RtirError> {
        let owner = self.get_ticket_owner(ticket_id).await?;
        let action = OwnershipAction::decide(&owner, self.session().user());

        match action {
            OwnershipAction::Take => {
                self.take_ticket(ticket_id).await?;
            }
            OwnershipAction::Steal => {
                tracing::debug!(ticket_id = %ticket_id, owner = %owner, "Stealing ticket");
                self.steal_ticket(ticket_id).await?;
            }
            OwnershipAction::Keep => {
                tracing::trace!(ticket_id = %ticket_id, "Ticket already owned by current user");
            }
        }

        Ok(action)
    }

    /// Claims the ticket, adds a comment and closes it.
    pub async fn take_comment_close_ticket(
        &mut self,
        ticket_id: &str,
        comment: &str,
    ) -> Result<String, RtirError> {
        self.session().ensure_logged_in()?;

        let step = self.take_or_steal_ticket(ticket_id).await;
        self.log_step("take_or_steal", ticket_id, step);
        let step = self.comment_ticket(ticket_id, comment).await;
        self.log_step("comment", ticket_id, step);

        self.close_ticket(ticket_id).await
    }

    /// Claims the ticket, comments, classifies it in the incidents queue
    /// and closes it.
    pub async fn take_comment_classify_close_ticket(
        &mut self,
        ticket_id: &str,
        comment: &str,
        classification: &str,
    ) -> Result<String, RtirError> {
        self.session().ensure_logged_in()?;

        let step = self.take_or_steal_ticket(ticket_id).await;
        self.log_step("take_or_steal", ticket_id, step);
        let step = self.comment_ticket(ticket_id, comment).await;
        self.log_step("comment", ticket_id, step);
        self.classify(ticket_id, classification).await;

        self.close_ticket(ticket_id).await
    }

    /// Like [`RtirClient::take_comment_classify_close_ticket`], with a
    /// reply to the requestors before the comment.
    pub async fn take_reply_comment_classify_close_ticket(
        &mut self,
        ticket_id: &str,
        reply: &str,
        comment: &str,
        classification: &str,
    ) -> Result<String, RtirError> {
        self.session().ensure_logged_in()?;

        let step = self.take_or_steal_ticket(ticket_id).await;
        self.log_step("take_or_steal", ticket_id, step);
        let step = self.reply_ticket(ticket_id, reply, None, None).await;
        self.log_step("reply", ticket_id, step);
        let step = self.comment_ticket(ticket_id, comment).await;
        self.log_step("comment", ticket_id, step);
        self.classify(ticket_id, classification).await;

        self.close_ticket(ticket_id).await
    }

    /// Creates an incident report and processes it in one go: reply,
    /// comment, move to incidents, classify, set the IP, close.
    ///
    /// Returns the new ticket id.
    ///
    /// # Errors
    ///
    /// Only the creation step is fatal; later steps are logged.
    pub async fn autocreate_ticket(
        &mut self,
        requestor: &str,
        subject: &str,
        abuse_text: &str,
        comment: &str,
        ip_address: &str,
        classification: &str,
    ) -> Result<String, RtirError> {
        self.session().ensure_logged_in()?;

        let ticket_id = self
            .create_ticket(&NewTicket::new(requestor, subject, ""))
            .await?;
        let id = ticket_id.as_str();

        let step = self.reply_ticket(id, abuse_text, None, None).await;
        self.log_step("reply", id, step);
        let step = self.comment_ticket(id, comment).await;
        self.log_step("comment", id, step);
        self.classify(id, classification).await;
        let step = self.set_ticket_ip(id, ip_address).await;
        self.log_step("set_ip", id, step);
        let step = self.close_ticket(id).await;
        self.log_step("close", id, step);

        Ok(ticket_id)
    }

    async fn classify(&mut self, ticket_id: &str, classification: &str) {
        let step = self.set_ticket_queue(ticket_id, INCIDENTS_QUEUE).await;
        self.log_step("set_queue", ticket_id, step);
        let step = self
            .set_ticket_classification(ticket_id, classification)
            .await;
        self.log_step("set_classification", ticket_id, step);
    }

    fn log_step<T>(&self, step: &str, ticket_id: &str, result: Result<T, RtirError>) {
        if let Err(e) = result {
            tracing::warn!(
                step = %step,
                ticket_id = %ticket_id,
                error = %e.sanitized_display(self.secret_for_sanitization()),
                "Workflow step failed, continuing"
            );
        }
    }
}
