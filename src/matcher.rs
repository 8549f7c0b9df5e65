use crate::models::BankTransaction;

pub const MAX_CANDIDATES: usize = 5;

/// Two amounts closer than this are the same money.
pub const EXACT_TOLERANCE: f64 = 0.01;

/// Coarse prefilter: outstanding balance within 1% of the transaction amount.
const PREFILTER_PCT: f64 = 0.01;

/// Near match: transaction amount within 5% of the invoice total.
const NEAR_PCT: f64 = 0.05;

const SCORE_EXACT_AMOUNT: u32 = 60;
const SCORE_NEAR_AMOUNT: u32 = 40;
const SCORE_REFERENCE: u32 = 30;
const SCORE_DATE_ORDER: u32 = 10;

/// The slice of an invoice the matcher sees, pre-joined with its client name.
#[derive(Debug, Clone)]
pub struct OpenInvoice {
    pub id: i64,
    pub invoice_number: String,
    pub client_name: String,
    pub total: f64,
    pub paid_amount: f64,
    pub date: String,
}

impl OpenInvoice {
    pub fn outstanding(&self) -> f64 {
        self.total - self.paid_amount
    }
}

/// Derived per scoring run, never persisted.
#[derive(Debug, Clone)]
pub struct MatchCandidate {
    pub invoice_id: i64,
    pub invoice_number: String,
    pub client_name: String,
    /// Outstanding balance at scoring time.
    pub amount: f64,
    pub date: String,
    pub confidence: u8,
}

pub fn within_prefilter(txn_amount: f64, outstanding: f64) -> bool {
    (outstanding - txn_amount).abs() <= txn_amount.abs() * PREFILTER_PCT
}

/// Additive confidence score in [0, 100]. Pure; neither side is mutated.
pub fn score(txn: &BankTransaction, invoice: &OpenInvoice) -> u8 {
    let mut score: u32 = 0;

    if (txn.amount - invoice.outstanding()).abs() < EXACT_TOLERANCE {
        score += SCORE_EXACT_AMOUNT;
    } else if (txn.amount - invoice.total).abs() <= invoice.total * NEAR_PCT {
        score += SCORE_NEAR_AMOUNT;
    }

    if let Some(reference) = &txn.reference {
        if reference.contains(&invoice.invoice_number) {
            score += SCORE_REFERENCE;
        }
    }

    // ISO dates compare lexicographically.
    if txn.date.as_str() >= invoice.date.as_str() {
        score += SCORE_DATE_ORDER;
    }

    score.min(100) as u8
}

/// Rank open invoices against one transaction: prefilter on amount, score,
/// sort descending, keep the top five. Ties keep the input order of
/// `invoices` (stable sort) — arbitrary but deterministic.
pub fn candidates(txn: &BankTransaction, invoices: &[OpenInvoice]) -> Vec<MatchCandidate> {
    let mut ranked: Vec<MatchCandidate> = invoices
        .iter()
        .filter(|inv| within_prefilter(txn.amount, inv.outstanding()))
        .map(|inv| MatchCandidate {
            invoice_id: inv.id,
            invoice_number: inv.invoice_number.clone(),
            client_name: inv.client_name.clone(),
            amount: inv.outstanding(),
            date: inv.date.clone(),
            confidence: score(txn, inv),
        })
        .collect();

    ranked.sort_by(|a, b| b.confidence.cmp(&a.confidence));
    ranked.truncate(MAX_CANDIDATES);
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TxnStatus;

    fn txn(amount: f64, date: &str, reference: Option<&str>) -> BankTransaction {
        BankTransaction {
            id: 1,
            account: "Attijariwafa".to_string(),
            date: date.to_string(),
            description: "VIREMENT RECU".to_string(),
            amount,
            reference: reference.map(str::to_string),
            status: TxnStatus::Unmatched,
            match_confidence: None,
        }
    }

    fn invoice(id: i64, number: &str, total: f64, paid: f64, date: &str) -> OpenInvoice {
        OpenInvoice {
            id,
            invoice_number: number.to_string(),
            client_name: "Maroc Telecom".to_string(),
            total,
            paid_amount: paid,
            date: date.to_string(),
        }
    }

    #[test]
    fn test_perfect_match_scores_100() {
        // Exact amount (60) + reference contains number (30) + date after (10)
        let t = txn(5000.0, "2024-03-10", Some("INV-2024-0001"));
        let inv = invoice(1, "INV-2024-0001", 5000.0, 0.0, "2024-03-01");
        assert_eq!(score(&t, &inv), 100);
    }

    #[test]
    fn test_exact_amount_scores_at_least_60() {
        let t = txn(1200.0, "2024-12-31", None);
        let inv = invoice(1, "FAC-2024-0007", 1200.005, 0.0, "2025-01-15");
        assert!(score(&t, &inv) >= 60);
    }

    #[test]
    fn test_near_amount_scores_40_not_60() {
        // 4% off the total: inside the 5% band, outside exact tolerance.
        let t = txn(960.0, "2024-03-01", None);
        let inv = invoice(1, "FAC-2024-0001", 1000.0, 0.0, "2024-02-01");
        assert_eq!(score(&t, &inv), 40 + 10);
    }

    #[test]
    fn test_reference_contribution_independent_of_amount() {
        // Amount is way off but the reference still earns its 30.
        let t = txn(10.0, "2024-01-01", Some("paiement FAC-2024-0042 merci"));
        let inv = invoice(1, "FAC-2024-0042", 9000.0, 0.0, "2024-02-01");
        assert_eq!(score(&t, &inv), 30);
    }

    #[test]
    fn test_date_before_invoice_gets_no_date_points() {
        let t = txn(500.0, "2024-01-01", None);
        let inv = invoice(1, "FAC-2024-0001", 500.0, 0.0, "2024-06-01");
        assert_eq!(score(&t, &inv), 60);
    }

    #[test]
    fn test_outstanding_not_total_drives_exact_match() {
        // 1000 total, 400 paid: a 600 transfer is an exact match.
        let t = txn(600.0, "2024-05-10", None);
        let inv = invoice(1, "FAC-2024-0003", 1000.0, 400.0, "2024-04-01");
        assert_eq!(score(&t, &inv), 60 + 10);
    }

    #[test]
    fn test_candidates_prefilter_excludes_distant_amounts() {
        let t = txn(1000.0, "2024-06-01", None);
        let invoices = vec![
            invoice(1, "FAC-2024-0001", 1000.0, 0.0, "2024-05-01"),
            invoice(2, "FAC-2024-0002", 1015.0, 0.0, "2024-05-01"), // 1.5% off
            invoice(3, "FAC-2024-0003", 1009.0, 0.0, "2024-05-01"), // 0.9% off
        ];
        let got = candidates(&t, &invoices);
        let ids: Vec<i64> = got.iter().map(|c| c.invoice_id).collect();
        assert_eq!(ids, vec![1, 3]);
    }

    #[test]
    fn test_candidates_capped_at_five_and_sorted() {
        let t = txn(1000.0, "2024-06-01", Some("FAC-2024-0004"));
        let invoices: Vec<OpenInvoice> = (1..=8)
            .map(|i| invoice(i, &format!("FAC-2024-{i:04}"), 1000.0, 0.0, "2024-05-01"))
            .collect();
        let got = candidates(&t, &invoices);
        assert_eq!(got.len(), MAX_CANDIDATES);
        for pair in got.windows(2) {
            assert!(pair[0].confidence >= pair[1].confidence);
        }
        // The referenced invoice outranks its identically-priced peers.
        assert_eq!(got[0].invoice_id, 4);
        assert_eq!(got[0].confidence, 100);
    }

    #[test]
    fn test_candidates_tie_break_is_input_order() {
        let t = txn(1000.0, "2024-06-01", None);
        let invoices = vec![
            invoice(7, "FAC-2024-0007", 1000.0, 0.0, "2024-05-01"),
            invoice(2, "FAC-2024-0002", 1000.0, 0.0, "2024-05-01"),
            invoice(5, "FAC-2024-0005", 1000.0, 0.0, "2024-05-01"),
        ];
        let got = candidates(&t, &invoices);
        let ids: Vec<i64> = got.iter().map(|c| c.invoice_id).collect();
        assert_eq!(ids, vec![7, 2, 5]);
    }

    #[test]
    fn test_candidate_amount_is_outstanding() {
        let t = txn(600.0, "2024-06-01", None);
        let invoices = vec![invoice(1, "FAC-2024-0001", 1000.0, 400.0, "2024-05-01")];
        let got = candidates(&t, &invoices);
        assert_eq!(got.len(), 1);
        assert_eq!(got[0].amount, 600.0);
    }

    #[test]
    fn test_no_candidates_for_empty_universe() {
        let t = txn(1000.0, "2024-06-01", None);
        assert!(candidates(&t, &[]).is_empty());
    }
}
