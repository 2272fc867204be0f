use single_annotation::enrichment::EnrichmentResult;
use single_annotation::selection::{select_label, UNIDENTIFIED};
use single_annotation::testing::correction::CorrectionMethod;
use single_annotation::testing::inference::nonparametric::mann_whitney;
use single_annotation::testing::inference::parametric::fast_t_test_from_sums;
use single_annotation::testing::{Alternative, TTestType, TestResult};

#[cfg(test)]
mod quick_test {
    use super::*;

    fn result(pathway: &str, nes: f64, padj: f64) -> EnrichmentResult {
        EnrichmentResult {
            pathway: pathway.to_string(),
            size: 15,
            es: nes / 2.0,
            nes,
            p_value: padj,
            padj,
            log2_err: 0.2,
            leading_edge: vec![],
        }
    }

    #[test]
    fn check_if_ttest_works() {
        // Group 1: [1, 2, 3], group 2: [7, 8, 9]
        let result: TestResult =
            fast_t_test_from_sums(6.0, 14.0, 3.0, 24.0, 194.0, 3.0, TTestType::Student);

        println!("T-statistic: {}", result.statistic);
        println!("P-value: {}", result.p_value);

        assert!(result.statistic < -2.0);
        assert!(result.p_value < 0.05);
    }

    #[test]
    fn check_identical_groups() {
        let result = fast_t_test_from_sums(15.0, 75.0, 3.0, 15.0, 75.0, 3.0, TTestType::Welch);
        assert_eq!(result.statistic, 0.0);
        assert_eq!(result.p_value, 1.0);
    }

    #[test]
    fn check_mann_whitney_direction() {
        let high = [5.0, 6.0, 7.0, 8.0];
        let low = [1.0, 2.0, 3.0, 4.0];
        let up = mann_whitney(&high, &low, Alternative::TwoSided);
        let down = mann_whitney(&low, &high, Alternative::TwoSided);
        assert!(up.extra("z_score").unwrap() > 0.0);
        assert!(down.extra("z_score").unwrap() < 0.0);
        assert!((up.p_value - down.p_value).abs() < 1e-12);
    }

    #[test]
    fn check_correction_methods_are_conservative() {
        let p = vec![0.001, 0.01, 0.02, 0.04, 0.2];
        for method in [
            CorrectionMethod::BenjaminiHochberg,
            CorrectionMethod::BenjaminiYekutieli,
            CorrectionMethod::Bonferroni,
            CorrectionMethod::Holm,
        ] {
            let adjusted = method.adjust(&p).unwrap();
            for (raw, adj) in p.iter().zip(&adjusted) {
                assert!(adj >= raw, "{:?}", method);
                assert!(*adj <= 1.0);
            }
        }
    }

    #[test]
    fn check_selector_tie_break_law() {
        // lower padj wins regardless of NES
        let a = result("A", 1.1, 0.001);
        let b = result("B", 4.0, 0.002);
        assert_eq!(select_label(0, &[b.clone(), a.clone()]).label, "A");

        // equal padj: higher NES wins, independent of input order
        let c = result("C", 2.0, 0.01);
        let d = result("D", 2.5, 0.01);
        assert_eq!(select_label(0, &[c.clone(), d.clone()]).label, "D");
        assert_eq!(select_label(0, &[d, c]).label, "D");
    }

    #[test]
    fn check_unidentified_fallback() {
        let label = select_label(4, &[result("Neg", -2.0, 0.001), result("Ns", 2.0, 0.3)]);
        assert_eq!(label.cluster, 4);
        assert_eq!(label.label, UNIDENTIFIED);
        assert_eq!(label.nes, None);
        assert_eq!(label.padj, None);
    }
}
