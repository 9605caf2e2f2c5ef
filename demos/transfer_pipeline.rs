use ndarray::{arr3, Axis};
use spd_transfer::prelude::*;

fn main() -> Result<()> {
    println!("=== Domain Re-centering and Re-scaling ===\n");

    // Two recording sessions with very different covariance scales
    let x_train = arr3(&[
        [[2.0, 0.2], [0.2, 1.0]],
        [[3.0, 0.1], [0.1, 1.5]],
        [[2.5, 0.3], [0.3, 1.2]],
        [[20.0, 1.0], [1.0, 9.0]],
        [[25.0, 2.0], [2.0, 12.0]],
        [[18.0, 0.5], [0.5, 10.0]],
    ]);
    let y_train = ["left", "right", "left", "right", "left", "right"];
    let domains = ["s1", "s1", "s1", "s2", "s2", "s2"];

    let mut recenter = DomainRecenterer::new(RecenterConfig::new(domains));
    let mut rescale = DomainRescaler::new(RescaleConfig::new(domains));

    let train = recenter.fit_transform(x_train, &y_train)?;
    let train = rescale.fit_transform(train, &y_train)?;

    for (domain, mean) in recenter.means()? {
        println!("Mean of {}:\n{:?}\n", domain, mean);
    }
    for (domain, dispersion) in rescale.dispersions()? {
        println!("Dispersion of {} after re-centering: {:.6}", domain, dispersion);
    }

    // A third session, never seen during training
    let x_test = arr3(&[
        [[5.0, 0.4], [0.4, 3.0]],
        [[6.0, 0.2], [0.2, 2.5]],
        [[4.5, 0.6], [0.6, 3.5]],
    ]);
    let test = recenter.transform(x_test)?;
    let test = rescale.transform(test)?;

    let geometry = Metric::Riemann.geometry(2);
    let matrices: Vec<_> = test.outer_iter().map(|m| m.to_owned()).collect();
    let mean = geometry.barycenter(&matrices, &Convergence::default())?;
    println!("\nMean of the transformed test session (should be I):\n{:?}", mean);

    println!(
        "\nTransformed {} training and {} test matrices",
        train.len_of(Axis(0)),
        test.len_of(Axis(0))
    );
    Ok(())
}
