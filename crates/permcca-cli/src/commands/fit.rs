use permcca_core::{Cca, bartlett_tests};

use super::InputArgs;

pub fn run(input: &InputArgs, components: usize) {
    let (x, y) = super::load_pair(input);
    let cca = Cca::new(components);
    let fitted = match cca.fit(&x, &y) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(1);
        }
    };

    println!(
        "CCA fit on {} rows: X {} features, Y {} features\n",
        fitted.n_obs(),
        fitted.n_x_features(),
        fitted.n_y_features()
    );
    println!("Canonical correlations:");
    for (i, r) in fitted.canonical_correlations().iter().enumerate() {
        let marker = if i < components { "" } else { "  (not requested)" };
        println!("  {:>3}  {:.4}{marker}", i + 1, r);
    }
    println!();

    let tests = bartlett_tests(
        fitted.canonical_correlations(),
        fitted.n_obs(),
        fitted.n_x_features(),
        fitted.n_y_features(),
        components,
    );
    super::evaluate::print_bartlett_table(&tests);
}
