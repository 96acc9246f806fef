// ============================================================================
// Pagination du tableau des marchés
// ============================================================================
// Calcule le nombre de pages, la plage de résultats affichée et la liste
// des numéros de page (avec ellipses) pour le footer
//
// Exemple avec 200 pages, page courante 10 :
//   1 … 8 9 10 11 … 200
// ============================================================================

/// Nombre de résultats par page proposés
pub const PER_PAGE_CHOICES: [u32; 3] = [50, 100, 150];

/// Valeur par défaut du nombre de résultats par page
pub const DEFAULT_PER_PAGE: u32 = 50;

/// Nombre maximum de pages visibles dans la liste (1 et la dernière comprises
/// dans le calcul de la fenêtre)
const MAX_VISIBLE_PAGES: i64 = 5;

/// Un élément de la liste des pages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageItem {
    Page(u32),
    Ellipsis,
}

/// État de pagination (page courante 1-based)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: u32,
    pub per_page: u32,

    /// Nombre total de coins (active_cryptocurrencies de /global), 0 si inconnu
    pub total: u64,
}

impl Pagination {
    pub fn new(per_page: u32) -> Self {
        Self {
            page: 1,
            per_page: per_page.max(1),
            total: 0,
        }
    }

    /// Nombre total de pages (0 si le total est inconnu)
    pub fn total_pages(&self) -> u32 {
        if self.total == 0 {
            return 0;
        }
        let per_page = u64::from(self.per_page.max(1));
        let pages = (self.total + per_page - 1) / per_page;
        u32::try_from(pages).unwrap_or(u32::MAX)
    }

    /// Plage "Showing X to Y" (1-based, inclusive). None si total inconnu
    pub fn result_range(&self) -> Option<(u64, u64)> {
        if self.total == 0 {
            return None;
        }
        let per_page = u64::from(self.per_page);
        let page = u64::from(self.page.max(1));
        let start = (page - 1) * per_page + 1;
        let end = (page * per_page).min(self.total);
        Some((start, end))
    }

    /// true s'il existe une page après la page courante
    ///
    /// Sans total connu on suppose qu'il y a une suite
    pub fn has_next(&self) -> bool {
        let total_pages = self.total_pages();
        total_pages == 0 || self.page < total_pages
    }

    pub fn has_previous(&self) -> bool {
        self.page > 1
    }

    /// Passe à la page suivante. Retourne false si déjà à la dernière
    pub fn next_page(&mut self) -> bool {
        if self.has_next() {
            self.page += 1;
            true
        } else {
            false
        }
    }

    /// Passe à la page précédente. Retourne false si déjà à la première
    pub fn previous_page(&mut self) -> bool {
        if self.has_previous() {
            self.page -= 1;
            true
        } else {
            false
        }
    }

    /// Va directement à une page (bornée à [1, total_pages])
    pub fn go_to(&mut self, page: u32) {
        let total_pages = self.total_pages();
        let upper = if total_pages == 0 { u32::MAX } else { total_pages };
        self.page = page.clamp(1, upper);
    }

    /// Passe au choix suivant de résultats par page (50 → 100 → 150 → 50)
    ///
    /// Revient à la page 1 : l'ancienne page n'a plus de sens
    pub fn cycle_per_page(&mut self) {
        let position = PER_PAGE_CHOICES
            .iter()
            .position(|&p| p == self.per_page)
            .unwrap_or(PER_PAGE_CHOICES.len() - 1);
        self.per_page = PER_PAGE_CHOICES[(position + 1) % PER_PAGE_CHOICES.len()];
        self.page = 1;
    }

    /// Liste des pages à afficher
    ///
    /// - la page 1 toujours
    /// - une ellipse si la fenêtre commence après 2
    /// - la fenêtre centrée sur la page courante
    /// - une ellipse si la fenêtre s'arrête avant l'avant-dernière page
    /// - la dernière page s'il y a plus d'une page
    pub fn page_items(&self) -> Vec<PageItem> {
        let total_pages = i64::from(self.total_pages());
        if total_pages == 0 {
            return Vec::new();
        }

        let current = i64::from(self.page);
        let mut items = vec![PageItem::Page(1)];

        let mut start = 2.max(current - MAX_VISIBLE_PAGES / 2);
        let end = (total_pages - 1).min(start + MAX_VISIBLE_PAGES - 2);

        if end - start < MAX_VISIBLE_PAGES - 2 {
            start = 2.max(end - (MAX_VISIBLE_PAGES - 2));
        }

        if start > 2 {
            items.push(PageItem::Ellipsis);
        }

        for page in start..=end {
            items.push(PageItem::Page(page as u32));
        }

        if end < total_pages - 1 {
            items.push(PageItem::Ellipsis);
        }

        if total_pages > 1 {
            items.push(PageItem::Page(total_pages as u32));
        }

        items
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self::new(DEFAULT_PER_PAGE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use PageItem::{Ellipsis, Page};

    fn pagination(page: u32, per_page: u32, total: u64) -> Pagination {
        Pagination {
            page,
            per_page,
            total,
        }
    }

    #[test]
    fn test_total_pages_rounds_up() {
        assert_eq!(pagination(1, 50, 0).total_pages(), 0);
        assert_eq!(pagination(1, 50, 50).total_pages(), 1);
        assert_eq!(pagination(1, 50, 51).total_pages(), 2);
        assert_eq!(pagination(1, 100, 14512).total_pages(), 146);
    }

    #[test]
    fn test_result_range() {
        assert_eq!(pagination(1, 50, 120).result_range(), Some((1, 50)));
        assert_eq!(pagination(3, 50, 120).result_range(), Some((101, 120)));
        assert_eq!(pagination(1, 50, 0).result_range(), None);
    }

    #[test]
    fn test_page_items_middle() {
        let items = pagination(10, 50, 10_000).page_items();
        assert_eq!(
            items,
            vec![Page(1), Ellipsis, Page(8), Page(9), Page(10), Page(11), Ellipsis, Page(200)]
        );
    }

    #[test]
    fn test_page_items_start() {
        let items = pagination(1, 50, 10_000).page_items();
        assert_eq!(
            items,
            vec![Page(1), Page(2), Page(3), Page(4), Page(5), Ellipsis, Page(200)]
        );
    }

    #[test]
    fn test_page_items_end() {
        let items = pagination(200, 50, 10_000).page_items();
        assert_eq!(
            items,
            vec![Page(1), Ellipsis, Page(196), Page(197), Page(198), Page(199), Page(200)]
        );
    }

    #[test]
    fn test_page_items_few_pages() {
        assert_eq!(pagination(1, 50, 10).page_items(), vec![Page(1)]);
        assert_eq!(pagination(1, 50, 60).page_items(), vec![Page(1), Page(2)]);
        assert_eq!(
            pagination(2, 50, 200).page_items(),
            vec![Page(1), Page(2), Page(3), Page(4)]
        );
        assert!(pagination(1, 50, 0).page_items().is_empty());
    }

    #[test]
    fn test_navigation_bounds() {
        let mut p = pagination(1, 50, 120);
        assert!(!p.previous_page());
        assert!(p.next_page());
        assert!(p.next_page());
        assert_eq!(p.page, 3);
        assert!(!p.next_page());

        p.go_to(99);
        assert_eq!(p.page, 3);
        p.go_to(0);
        assert_eq!(p.page, 1);
    }

    #[test]
    fn test_unknown_total_allows_next() {
        let mut p = Pagination::default();
        assert!(p.has_next());
        assert!(p.next_page());
        assert_eq!(p.page, 2);
    }

    #[test]
    fn test_cycle_per_page_resets_page() {
        let mut p = pagination(4, 50, 1000);
        p.cycle_per_page();
        assert_eq!((p.page, p.per_page), (1, 100));
        p.cycle_per_page();
        assert_eq!(p.per_page, 150);
        p.cycle_per_page();
        assert_eq!(p.per_page, 50);
    }
}
