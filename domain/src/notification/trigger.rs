use super::NewNotification;
use crate::Id;
use entity::notification_type::NotificationType;

/// Business events that notify the user who owns the affected record.
#[derive(Debug, Clone, PartialEq)]
pub enum Trigger {
    FeedbackReceived {
        project_id: Id,
        project_name: String,
        client_name: String,
    },
    ProjectUpdated {
        project_id: Id,
        project_name: String,
        status: String,
    },
    ProposalAccepted {
        proposal_id: Id,
        proposal_title: String,
        client_name: String,
    },
    InvoicePaid {
        invoice_id: Id,
        invoice_number: String,
        amount: String,
    },
    LeadCaptured {
        lead_id: Id,
        lead_name: String,
        source: String,
    },
}

impl Trigger {
    pub fn notification_type(&self) -> NotificationType {
        match self {
            Trigger::FeedbackReceived { .. } => NotificationType::Feedback,
            Trigger::ProjectUpdated { .. } => NotificationType::ProjectUpdate,
            Trigger::ProposalAccepted { .. } => NotificationType::Proposal,
            Trigger::InvoicePaid { .. } => NotificationType::Invoice,
            Trigger::LeadCaptured { .. } => NotificationType::Lead,
        }
    }

    /// Builds the notification addressed to `user_id` for this event.
    pub fn into_notification(self, user_id: Id) -> NewNotification {
        let notification_type = self.notification_type();
        let (title, message, link) = match self {
            Trigger::FeedbackReceived {
                project_id,
                project_name,
                client_name,
            } => (
                "New client feedback".to_string(),
                format!("{client_name} left feedback on {project_name}"),
                format!("/projects/{project_id}"),
            ),
            Trigger::ProjectUpdated {
                project_id,
                project_name,
                status,
            } => (
                "Project updated".to_string(),
                format!("{project_name} moved to {status}"),
                format!("/projects/{project_id}"),
            ),
            Trigger::ProposalAccepted {
                proposal_id,
                proposal_title,
                client_name,
            } => (
                "Proposal accepted".to_string(),
                format!("{client_name} accepted {proposal_title}"),
                format!("/proposals/{proposal_id}"),
            ),
            Trigger::InvoicePaid {
                invoice_id,
                invoice_number,
                amount,
            } => (
                "Invoice paid".to_string(),
                format!("Invoice {invoice_number} was paid ({amount})"),
                format!("/invoices/{invoice_id}"),
            ),
            Trigger::LeadCaptured {
                lead_id,
                lead_name,
                source,
            } => (
                "New lead".to_string(),
                format!("{lead_name} came in from {source}"),
                format!("/leads/{lead_id}"),
            ),
        };

        NewNotification {
            user_id,
            title,
            message,
            notification_type,
            link: Some(link),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn feedback_links_to_the_project() {
        let project_id = Id::new_v4();
        let user_id = Id::new_v4();

        let notification = Trigger::FeedbackReceived {
            project_id,
            project_name: "Website redesign".to_string(),
            client_name: "Acme".to_string(),
        }
        .into_notification(user_id);

        assert_eq!(notification.user_id, user_id);
        assert_eq!(notification.notification_type, NotificationType::Feedback);
        assert_eq!(notification.message, "Acme left feedback on Website redesign");
        assert_eq!(notification.link, Some(format!("/projects/{project_id}")));
    }

    #[test]
    fn invoice_paid_is_an_invoice_notification() {
        let notification = Trigger::InvoicePaid {
            invoice_id: Id::new_v4(),
            invoice_number: "INV-0042".to_string(),
            amount: "$1,200.00".to_string(),
        }
        .into_notification(Id::new_v4());

        assert_eq!(notification.notification_type, NotificationType::Invoice);
        assert_eq!(notification.title, "Invoice paid");
        assert!(notification.message.contains("INV-0042"));
    }
}
