//! Convergence plots for coupling loops.
//!
//! See [`PlotObserver`] and [`Plottable`] for usage.

use eframe::egui;
use egui_plot::{Legend, Line, Plot, PlotPoints};
use tandem_core::Observer;
use tandem_drivers::fsi;

/// Window options for [`PlotObserver::show`].
#[derive(Debug, Clone, Default)]
pub struct ShowConfig {
    title: Option<String>,
    legend: bool,
    log_y: bool,
}

impl ShowConfig {
    /// Untitled, no legend, linear y-axis.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    #[must_use]
    pub fn legend(mut self) -> Self {
        self.legend = true;
        self
    }

    /// Plots `log₁₀ y`; non-positive values are dropped.
    #[must_use]
    pub fn log_y(mut self) -> Self {
        self.log_y = true;
        self
    }
}

/// Turns an event into one point per trace.
///
/// Return `None` from [`x`](Plottable::x) to skip the event, or `None` in a
/// trace slot to skip only that trace.
pub trait Plottable<const N: usize> {
    fn x(&self) -> Option<f64>;

    fn traces(&self) -> [Option<f64>; N];
}

/// Plots the delta norm and relaxation factor against the cumulative
/// iteration count.
///
/// The x value is `step · 1000 + iter` so successive steps line up left to
/// right without overlapping.
impl Plottable<2> for fsi::Event {
    fn x(&self) -> Option<f64> {
        Some((self.step * 1000 + self.iter) as f64)
    }

    fn traces(&self) -> [Option<f64>; 2] {
        [Some(self.delta_norm), Some(self.relaxation)]
    }
}

/// Collects traces while a driver runs and shows them in an egui window.
///
/// Pass `&mut PlotObserver` as the observer so the data can be shown once
/// the run returns:
///
/// ```ignore
/// let mut plot = PlotObserver::<2>::new(["delta norm", "relaxation"]);
/// for step in 0..10 {
///     driver.run_observed(step, &mut plot)?;
/// }
/// plot.show(ShowConfig::new().title("BGS coupling").legend().log_y())?;
/// ```
///
/// For events without a [`Plottable`] impl, call
/// [`record`](PlotObserver::record) from a closure observer instead.
#[derive(Debug, Clone)]
pub struct PlotObserver<const N: usize> {
    names: [String; N],
    traces: [Vec<[f64; 2]>; N],
}

impl<const N: usize> PlotObserver<N> {
    pub fn new(names: [&str; N]) -> Self {
        Self {
            names: names.map(str::to_owned),
            traces: std::array::from_fn(|_| Vec::new()),
        }
    }

    /// Adds a point at `x` to every trace whose value is `Some`.
    pub fn record(&mut self, x: f64, values: [Option<f64>; N]) {
        for (trace, y) in self.traces.iter_mut().zip(values) {
            if let Some(y) = y {
                trace.push([x, y]);
            }
        }
    }

    /// Returns the points recorded for trace `index`.
    #[must_use]
    pub fn points(&self, index: usize) -> &[[f64; 2]] {
        self.traces.get(index).map_or(&[], Vec::as_slice)
    }

    /// Opens a window with all traces and blocks until it is closed.
    ///
    /// # Errors
    ///
    /// Returns an error if the native window cannot be created.
    pub fn show(self, config: ShowConfig) -> Result<(), eframe::Error> {
        let title = config.title.clone().unwrap_or_else(|| "tandem".to_owned());
        let app = PlotApp {
            traces: self.names.into_iter().zip(self.traces).collect(),
            config,
        };
        eframe::run_native(
            &title,
            eframe::NativeOptions::default(),
            Box::new(move |_cc| Ok(Box::new(app))),
        )
    }
}

impl<const N: usize, E, A> Observer<E, A> for PlotObserver<N>
where
    E: Plottable<N>,
{
    fn observe(&mut self, event: &E) -> Option<A> {
        if let Some(x) = event.x() {
            self.record(x, event.traces());
        }
        None
    }
}

impl<const N: usize, E, A> Observer<E, A> for &mut PlotObserver<N>
where
    E: Plottable<N>,
{
    fn observe(&mut self, event: &E) -> Option<A> {
        (**self).observe(event)
    }
}

struct PlotApp {
    traces: Vec<(String, Vec<[f64; 2]>)>,
    config: ShowConfig,
}

impl eframe::App for PlotApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        egui::CentralPanel::default().show(ctx, |ui| {
            let mut plot = Plot::new("tandem_plot").x_axis_label("iteration");
            if self.config.legend {
                plot = plot.legend(Legend::default());
            }
            if self.config.log_y {
                plot = plot.y_axis_label("log₁₀");
            }
            let log_y = self.config.log_y;
            plot.show(ui, |plot_ui| {
                for (name, points) in &self.traces {
                    let points: PlotPoints = points
                        .iter()
                        .filter(|p| !log_y || p[1] > 0.0)
                        .map(|p| if log_y { [p[0], p[1].log10()] } else { *p })
                        .collect();
                    plot_ui.line(Line::new(points).name(name));
                }
            });
        });
    }
}
